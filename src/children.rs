// Child categorization against one room's age limits

/// Children split by whether a room's age limits accept them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChildCategories {
    pub valid_children: Vec<u8>,
    // Too old for every limit: these occupy adult slots
    pub promoted: Vec<u8>,
}

impl ChildCategories {
    pub fn promoted_adults(&self) -> u32 {
        self.promoted.len() as u32
    }
}

/// A child is valid when its age is within at least one positive limit.
/// With no positive limits every child is promoted to an adult.
pub fn categorize_children(child_ages: &[u8], age_limits: &[u8]) -> ChildCategories {
    let (valid_children, promoted): (Vec<u8>, Vec<u8>) = child_ages.iter().partition(|age| {
        age_limits
            .iter()
            .any(|limit| *limit > 0 && **age <= *limit)
    });

    ChildCategories {
        valid_children,
        promoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[5, 10], &[12], &[5, 10], &[]; "#1 All within limit")]
    #[test_case(&[16], &[12], &[], &[16]; "#2 Too old is promoted")]
    #[test_case(&[3, 8, 15], &[6, 12], &[3, 8], &[15]; "#3 Tiered limits")]
    #[test_case(&[12], &[12], &[12], &[]; "#4 Limit is inclusive")]
    #[test_case(&[2, 4], &[], &[], &[2, 4]; "#5 No limits promotes everyone")]
    #[test_case(&[0], &[0, 0], &[], &[0]; "#6 Zero limits never match")]
    fn test_categorize_children(
        ages: &[u8],
        limits: &[u8],
        expected_valid: &[u8],
        expected_promoted: &[u8],
    ) {
        let categories = categorize_children(ages, limits);
        assert_eq!(categories.valid_children, expected_valid);
        assert_eq!(categories.promoted, expected_promoted);
        assert_eq!(categories.promoted_adults(), expected_promoted.len() as u32);
    }

    #[test]
    fn test_order_is_preserved() {
        let categories = categorize_children(&[11, 17, 2, 14, 7], &[12]);
        assert_eq!(categories.valid_children, vec![11, 2, 7]);
        assert_eq!(categories.promoted, vec![17, 14]);
    }
}
