//! Field checks shared by the `New*` input types.

use crate::{Error, Result};

pub(crate) fn char_len(
  field: &'static str,
  value: &str,
  min: usize,
  max: Option<usize>,
) -> Result<()> {
  let len = value.trim().chars().count();
  if len < min {
    return Err(Error::Validation {
      field,
      reason: format!("must be at least {min} characters"),
    });
  }
  if let Some(max) = max
    && len > max
  {
    return Err(Error::Validation {
      field,
      reason: format!("must be at most {max} characters"),
    });
  }
  Ok(())
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<()> {
  char_len(field, value, 1, None)
}
