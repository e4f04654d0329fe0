//! Result type alias for canvas-shield

use super::errors::ShieldError;

/// Result type alias for canvas-shield operations
///
/// # Examples
///
/// ```
/// use canvas_shield::domain::result::Result;
/// use canvas_shield::domain::errors::ShieldError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ShieldError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ShieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(ShieldError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
