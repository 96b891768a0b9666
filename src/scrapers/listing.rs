//! Extraction of news items from a listing page.
//!
//! A listing page is any page that shows a run of article teasers: a front
//! page, a section page, a "latest news" page. Each teaser becomes one
//! [`Record`]; which elements count as a teaser and where its title, image,
//! description and link live is decided by CSS selectors.

use super::{ScrapeError, SelectorConfig};
use crate::models::Record;
use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled form of [`SelectorConfig`].
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    item: Selector,
    title: Selector,
    image: Selector,
    description: Selector,
    link: Selector,
}

impl ListingSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            item: parse(&config.item)?,
            title: parse(&config.title)?,
            image: parse(&config.image)?,
            description: parse(&config.description)?,
            link: parse(&config.link)?,
        })
    }
}

fn parse(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("`{css}`: {e}")))
}

/// Pull one record out of every teaser on the page.
///
/// Relative image and link URLs are resolved against `base`. Teasers with
/// neither a title nor a link are skipped.
pub fn extract_records(html: &str, base: &Url, selectors: &ListingSelectors) -> Vec<Record> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.item)
        .filter_map(|item| {
            let titulo = first(item, &selectors.title).and_then(text_of);
            let descripcion = first(item, &selectors.description).and_then(text_of);
            let imagen = first(item, &selectors.image)
                .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
                .and_then(|src| resolve(base, src));
            let enlace = first(item, &selectors.link)
                .and_then(|a| a.value().attr("href"))
                .or_else(|| item.value().attr("href"))
                .and_then(|href| resolve(base, href));

            if titulo.is_none() && enlace.is_none() {
                return None;
            }
            Some(Record::from_text(titulo, imagen, descripcion, enlace))
        })
        .collect()
}

fn first<'a>(item: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    item.select(selector).next()
}

fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

fn resolve(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    base.join(raw).ok().map(String::from)
}
