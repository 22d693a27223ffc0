//! `status`: one snapshot fetch.

use housecontrol_core::{CoreError, KeypadConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(keypad: &KeypadConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let client = keypad.build_client()?;
    let snapshot = client.status().await.map_err(CoreError::from)?;

    let color = output::should_color(global.color);
    let out = output::render(global.output, &snapshot, |s| {
        [
            output::field("alarm", &s.alarm, color),
            output::field("garage door", &s.garage_door, color),
        ]
        .join("\n")
    });
    output::print_output(&out);
    Ok(())
}
