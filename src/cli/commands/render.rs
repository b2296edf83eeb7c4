use crate::cli::app::EventArgs;
use crate::notify::MessageFormatter;

pub fn handle_render(event: &EventArgs) -> anyhow::Result<()> {
    let message = MessageFormatter::new().render(&event.to_event());
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}
