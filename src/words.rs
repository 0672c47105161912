use teloxide::utils::html;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPage<'a> {
    pub index: usize,
    pub words: &'a [String],
    pub has_prev: bool,
    pub has_next: bool,
}

/// Slice of the word list for page `index`, or `None` when the page starts
/// past the end of the list.
pub fn page(words: &[String], index: usize, page_size: usize) -> Option<WordPage<'_>> {
    let total = words.len();
    let first = index.checked_mul(page_size)?;
    if page_size == 0 || first >= total {
        return None;
    }
    let until = first.saturating_add(page_size).min(total);

    Some(WordPage {
        index,
        words: &words[first..until],
        has_prev: index > 0,
        has_next: until < total,
    })
}

/// Page 0, which exists even when the list is empty.
pub fn first_page(words: &[String], page_size: usize) -> WordPage<'_> {
    page(words, 0, page_size).unwrap_or(WordPage {
        index: 0,
        words: &[],
        has_prev: false,
        has_next: false,
    })
}

impl WordPage<'_> {
    pub fn has_navigation(&self) -> bool {
        self.has_prev || self.has_next
    }

    pub fn render(&self) -> String {
        let mut text = format!("<b>Страница {}</b>\n", self.index + 1);
        if self.words.is_empty() {
            text.push_str("\nСписок слов пока пуст.");
        }
        for word in self.words {
            text.push('\n');
            text.push_str(&html::escape(word));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn first_page_has_only_next() {
        let words = words(25);
        let page = page(&words, 0, PAGE_SIZE).unwrap();
        assert_eq!(page.words.len(), 10);
        assert_eq!(page.words[0], "w0");
        assert!(!page.has_prev);
        assert!(page.has_next);
    }

    #[test]
    fn last_page_is_partial_and_has_only_prev() {
        let words = words(25);
        let page = page(&words, 2, PAGE_SIZE).unwrap();
        assert_eq!(page.words, &words[20..25]);
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_page() {
        let words = words(20);
        let last = page(&words, 1, PAGE_SIZE).unwrap();
        assert!(!last.has_next);
        assert_eq!(page(&words, 2, PAGE_SIZE), None);
    }

    #[test]
    fn every_reachable_page_is_non_empty_with_matching_affordances() {
        for total in 1..35 {
            let words = words(total);
            let mut index = 0;
            while index * PAGE_SIZE < total {
                let page = page(&words, index, PAGE_SIZE).unwrap();
                assert!(!page.words.is_empty());
                assert_eq!(page.has_prev, index > 0);
                assert_eq!(page.has_next, (index + 1) * PAGE_SIZE < total);
                index += 1;
            }
            assert_eq!(super::page(&words, index + 1, PAGE_SIZE), None);
        }
    }

    #[test]
    fn out_of_range_and_empty_lists_are_no_ops() {
        assert_eq!(page(&words(5), 3, PAGE_SIZE), None);
        assert_eq!(page(&[], 0, PAGE_SIZE), None);
        assert_eq!(page(&words(5), usize::MAX, PAGE_SIZE), None);
    }

    #[test]
    fn first_page_of_empty_list_still_renders() {
        let page = first_page(&[], PAGE_SIZE);
        assert!(page.words.is_empty());
        assert!(!page.has_navigation());
        assert_eq!(page.render(), "<b>Страница 1</b>\n\nСписок слов пока пуст.");

        let words = words(12);
        assert_eq!(first_page(&words, PAGE_SIZE), super::page(&words, 0, PAGE_SIZE).unwrap());
    }

    #[test]
    fn render_escapes_words() {
        let words = vec!["der <Hund>".to_owned(), "die Katze".to_owned()];
        let text = page(&words, 0, PAGE_SIZE).unwrap().render();
        assert_eq!(text, "<b>Страница 1</b>\n\nder &lt;Hund&gt;\ndie Katze");
    }
}
