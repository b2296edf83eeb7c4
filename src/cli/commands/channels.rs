use crate::notify::ChannelRegistry;

pub fn handle_channels() {
    for channel_type in ChannelRegistry::with_defaults().channel_types() {
        println!("{channel_type}");
    }
}
