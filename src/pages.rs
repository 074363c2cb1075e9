//! Page-range expression parser.
//!
//! The mini-grammar is comma-separated tokens, each either a single page
//! number (`3`) or an inclusive range (`5-8`). Pages are 1-based in the
//! external contract; conversion to 0-based indices happens only at the
//! collaborator boundary.
//!
//! ## Lenient by design
//!
//! Malformed tokens (`abc`, `5-2`, `0`, anything past the last page) are
//! silently dropped rather than rejected — the user fixing one bad token
//! should not lose the valid ones they already typed. Out-of-range tokens
//! are dropped whole, never clamped. Only a selection that ends up *empty*
//! is escalated, and that decision belongs to the caller.

/// Parse a page-range expression into a sorted, deduplicated list of
/// 1-based page numbers, all within `[1, max_pages]`.
///
/// # Example
/// ```
/// use pdfworkbench::pages::parse_page_ranges;
///
/// assert_eq!(parse_page_ranges("1,3,5-8", 10), vec![1, 3, 5, 6, 7, 8]);
/// assert_eq!(parse_page_ranges("5-2", 10), Vec::<usize>::new());
/// ```
pub fn parse_page_ranges(input: &str, max_pages: usize) -> Vec<usize> {
    let mut pages: Vec<usize> = Vec::new();

    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once('-') {
            let start: usize = match start.trim().parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            let end: usize = match end.trim().parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            // The whole token must be valid or the whole token is dropped.
            if start < 1 || end < start || end > max_pages {
                continue;
            }
            pages.extend(start..=end);
        } else {
            match token.parse::<usize>() {
                Ok(n) if n >= 1 && n <= max_pages => pages.push(n),
                _ => continue,
            }
        }
    }

    pages.sort_unstable();
    pages.dedup();
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singles_and_ranges() {
        assert_eq!(parse_page_ranges("1,3,5-8", 10), vec![1, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn reversed_range_dropped() {
        assert_eq!(parse_page_ranges("5-2", 10), Vec::<usize>::new());
    }

    #[test]
    fn empty_input_yields_empty() {
        assert_eq!(parse_page_ranges("", 10), Vec::<usize>::new());
        assert_eq!(parse_page_ranges("  ,, ", 10), Vec::<usize>::new());
    }

    #[test]
    fn out_of_range_dropped_not_clamped() {
        assert_eq!(parse_page_ranges("11", 10), Vec::<usize>::new());
        // 8-12 exceeds max_pages so the whole token goes, not just 11-12
        assert_eq!(parse_page_ranges("8-12", 10), Vec::<usize>::new());
        assert_eq!(parse_page_ranges("0", 10), Vec::<usize>::new());
        assert_eq!(parse_page_ranges("0-3", 10), Vec::<usize>::new());
    }

    #[test]
    fn malformed_tokens_do_not_poison_valid_ones() {
        assert_eq!(parse_page_ranges("abc,2,x-y,4-5", 10), vec![2, 4, 5]);
        assert_eq!(parse_page_ranges("1-2-3,7", 10), vec![7]);
    }

    #[test]
    fn duplicates_across_tokens_removed() {
        assert_eq!(parse_page_ranges("3,1-4,2", 10), vec![1, 2, 3, 4]);
    }

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(parse_page_ranges(" 1 , 3 - 4 ", 10), vec![1, 3, 4]);
    }

    #[test]
    fn result_is_strictly_ascending_in_bounds() {
        let out = parse_page_ranges("9,1-3,7-9,2", 9);
        assert!(out.windows(2).all(|w| w[0] < w[1]));
        assert!(out.iter().all(|&p| (1..=9).contains(&p)));
    }
}
