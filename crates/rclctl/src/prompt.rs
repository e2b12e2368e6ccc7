//! Interactive image version prompt

use rcl_common::schema::SUPPORTED_IMAGE_VERSION;
use rcl_common::RclError;
use std::io::{BufRead, Write};

/// Ask until the operator types the supported image version.
///
/// End of input is `RclError::InputCancelled`.
pub fn ask_image_version<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<String, RclError> {
    loop {
        write!(output, "Please type the image version: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Err(RclError::InputCancelled);
        }

        let answer = line.trim();
        if answer == SUPPORTED_IMAGE_VERSION {
            return Ok(answer.to_string());
        }
        writeln!(output, "Image version should be {}", SUPPORTED_IMAGE_VERSION)?;
    }
}
