use emosync_primitives::Variant;

/// Pick the variant to keep under the byte ceiling.
///
/// Returns the qualifying variant with the greatest byte length, or
/// `None` when nothing fits. Ties are broken by input order (the last
/// maximal variant wins); the tie-break is unspecified and only
/// deterministic when the input order is. The selector never deletes
/// anything itself — callers discard the losing handles once the winner
/// is known.
pub fn select_variant(variants: &[Variant], ceiling: u64) -> Option<&Variant> {
    variants
        .iter()
        .filter(|variant| variant.len <= ceiling)
        .max_by_key(|variant| variant.len)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn variant(tag: &str, len: u64) -> Variant {
        Variant {
            tag: tag.to_owned(),
            len,
            handle: Utf8PathBuf::from(format!("/cache/{tag}")),
        }
    }

    #[test]
    fn picks_the_largest_qualifying_variant() {
        let variants = [variant("3x", 300_000), variant("2x", 120_000), variant("1x", 40_000)];

        let selected = select_variant(&variants, 262_144).unwrap();
        assert_eq!(selected.tag, "2x");
    }

    #[test]
    fn nothing_qualifies_above_the_ceiling() {
        let variants = [variant("3x", 300_000), variant("2x", 280_000)];
        assert!(select_variant(&variants, 262_144).is_none());
    }

    #[test]
    fn ceiling_is_inclusive() {
        let variants = [variant("1x", 262_144)];
        assert_eq!(select_variant(&variants, 262_144).unwrap().tag, "1x");
    }

    #[test]
    fn empty_variant_sets_select_nothing() {
        assert!(select_variant(&[], 262_144).is_none());
    }

    #[test]
    fn no_unselected_qualifier_is_larger() {
        let variants = [
            variant("4x", 500_000),
            variant("2x", 100_000),
            variant("3x", 200_000),
            variant("1x", 50_000),
        ];
        let ceiling = 262_144;

        let selected = select_variant(&variants, ceiling).unwrap();
        for candidate in &variants {
            if candidate.len <= ceiling {
                assert!(candidate.len <= selected.len);
            }
        }
    }
}
