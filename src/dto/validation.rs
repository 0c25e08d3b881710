//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum length accepted for a display name.
pub const MAX_DISPLAY_NAME_LEN: usize = 50;
/// Maximum length accepted for a game type identifier.
pub const MAX_GAME_TYPE_LEN: usize = 20;

/// Validates that a game type is 1 to 20 characters of lowercase
/// alphanumerics, `-` or `_`.
///
/// # Examples
///
/// ```ignore
/// validate_game_type("snake")      // Ok
/// validate_game_type("Snake")      // Err - uppercase
/// validate_game_type("")           // Err - empty
/// ```
pub fn validate_game_type(game_type: &str) -> Result<(), ValidationError> {
    if game_type.is_empty() || game_type.len() > MAX_GAME_TYPE_LEN {
        let mut err = ValidationError::new("game_type_length");
        err.message = Some(
            format!(
                "Game type must be 1 to {MAX_GAME_TYPE_LEN} characters (got {})",
                game_type.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !game_type
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("game_type_format");
        err.message =
            Some("Game type must contain only lowercase alphanumerics, `-` or `_`".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a display name is non-blank and at most 50 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!(
                "Display name must be at most {MAX_DISPLAY_NAME_LEN} characters (got {})",
                name.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}
