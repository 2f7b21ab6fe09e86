//! Academic term labels.
//!
//! Terms are labelled `"<start year>-<end year>-<n>"`: `n = 1` for the
//! autumn term (September through January), `n = 2` for the spring term
//! (February through August).

/// Term label for a calendar month.
///
/// January belongs to the autumn term that started the previous September.
/// Returns `None` for a month outside 1-12.
pub fn academic_term(year: i32, month: u32) -> Option<String> {
    match month {
        9..=12 => Some(format!("{}-{}-1", year, year + 1)),
        1 => Some(format!("{}-{}-1", year - 1, year)),
        2..=8 => Some(format!("{}-{}-2", year - 1, year)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autumn_term() {
        assert_eq!(academic_term(2024, 9).as_deref(), Some("2024-2025-1"));
        assert_eq!(academic_term(2024, 12).as_deref(), Some("2024-2025-1"));
        assert_eq!(academic_term(2025, 1).as_deref(), Some("2024-2025-1"));
    }

    #[test]
    fn test_spring_term() {
        assert_eq!(academic_term(2025, 2).as_deref(), Some("2024-2025-2"));
        assert_eq!(academic_term(2025, 8).as_deref(), Some("2024-2025-2"));
    }

    #[test]
    fn test_invalid_month() {
        assert!(academic_term(2025, 0).is_none());
        assert!(academic_term(2025, 13).is_none());
    }
}
