use scraper::{ElementRef, Selector};

/// A compiled CSS selector.
///
/// Selectors are written as constants next to the heuristics that use them.
/// One that fails to compile matches nothing instead of taking the program down.
#[derive(Debug, Clone)]
pub struct Query {
    selector: Option<Selector>,
}

impl Query {
    pub fn new(css: &'static str) -> Self {
        let selector = match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(err) => {
                tracing::warn!(css, error = %err, "selector failed to compile; it will match nothing");
                None
            }
        };
        Self { selector }
    }

    pub(crate) fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub(crate) fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.selector
            .as_ref()
            .is_some_and(|selector| selector.matches(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn invalid_selector_matches_nothing() {
        let query = Query::new("div[[");
        assert!(query.selector().is_none());
        let html = Html::parse_document("<div></div>");
        let div = html
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(!query.matches(&div));
    }

    #[test]
    fn valid_selector_matches_element() {
        let query = Query::new("div.group");
        let html = Html::parse_document(r#"<div class="group x"></div>"#);
        let div = html
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(query.matches(&div));
        assert!(query.selector().is_some());
    }
}
