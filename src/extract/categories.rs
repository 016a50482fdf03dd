//! Category discovery
//!
//! The site root exposes categories in several independent regions (rubric
//! grid, dropdown catalog, compact menu, top navigation, service tiles). Each
//! region is one [`Rule`]; every rule runs and the results are merged by
//! canonical URL. Aggregate categories are then visited once each to collect
//! their subcategories.

use super::patterns::is_aggregate_url;
use super::rules::Rule;
use crate::config::SiteConfig;
use crate::crawler::{Document, Node, PageFetcher};
use crate::models::Category;
use crate::normalize::normalize_url;
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A raw `(name, href)` pair read from one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub name: String,
    pub href: String,
}

/// Root-page regions, in merge priority order
const ROOT_RULES: &[Rule<CategoryLink>] = &[
    Rule {
        name: "rubricator grid",
        selector: "div.visual-rubricator-grid-s6aQm a.visual-rubricator-gridItem-MiBU_",
        extract: grid_link,
    },
    Rule {
        name: "dropdown catalog",
        selector: "div.index-module-nav-catalogs-_9ZX2 div.index-module-nav-catalog-item-a9Xx9 a",
        extract: text_link,
    },
    Rule {
        name: "compact menu",
        selector: "div.top-rubricator-hide-PSmtS a",
        extract: text_link,
    },
    Rule {
        name: "top navigation",
        selector: "ul.index-module-nav-stRnY li.index-module-nav-item-queVi a",
        extract: root_relative_link,
    },
    Rule {
        name: "service tiles",
        selector: "div.service-item-QPvjs",
        extract: service_tile_link,
    },
];

/// Category-page regions listing subcategories
const SUBCATEGORY_RULES: &[Rule<CategoryLink>] = &[
    Rule {
        name: "category map",
        selector: "div[data-marker='category-map'] a",
        extract: named_link,
    },
    Rule {
        name: "rubricator list",
        selector: "ul.rubricator-list li a",
        extract: named_link,
    },
];

fn grid_link(node: Node<'_>) -> Option<CategoryLink> {
    Some(CategoryLink {
        name: node.first_text("p").unwrap_or_default(),
        href: node.attr_non_empty("href")?.to_string(),
    })
}

fn text_link(node: Node<'_>) -> Option<CategoryLink> {
    Some(CategoryLink {
        name: node.text(),
        href: node.attr_non_empty("href")?.to_string(),
    })
}

fn root_relative_link(node: Node<'_>) -> Option<CategoryLink> {
    text_link(node).filter(|link| link.href.starts_with('/'))
}

fn service_tile_link(node: Node<'_>) -> Option<CategoryLink> {
    let anchor = node.parent().filter(|parent| parent.tag() == "a")?;
    Some(CategoryLink {
        name: node.first_text("span").unwrap_or_default(),
        href: anchor.attr_non_empty("href")?.to_string(),
    })
}

fn named_link(node: Node<'_>) -> Option<CategoryLink> {
    text_link(node).filter(|link| !link.name.is_empty())
}

/// Ordered merge of categories keyed by canonical URL
///
/// The first non-empty name seen for a URL wins; later names never overwrite
/// it. Insertion order is kept so output is stable across runs of the same page.
#[derive(Debug, Default)]
pub struct CategoryMerge {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl CategoryMerge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `(name, url)` discovery; returns true if the URL was new
    pub fn insert(&mut self, name: &str, url: String) -> bool {
        if let Some(&position) = self.index.get(&url) {
            let existing = &mut self.categories[position];
            if existing.name.is_empty() && !name.is_empty() {
                existing.name = name.to_string();
            }
            return false;
        }

        self.index.insert(url.clone(), self.categories.len());
        self.categories.push(Category::new(name, url));
        true
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns the merged categories, dropping any that never got a name
    pub fn into_categories(self) -> Vec<Category> {
        self.categories
            .into_iter()
            .filter(|category| !category.name.is_empty())
            .collect()
    }
}

/// Extracts top-level categories from the site root
pub fn extract_root_categories(document: &Document, site: &SiteConfig) -> Vec<Category> {
    let mut merge = CategoryMerge::new();

    for rule in ROOT_RULES {
        let links = rule.collect(document.root());
        let mut added = 0;
        for link in links {
            let url = normalize_url(&link.href, site.origin());
            tracing::trace!("Found category in {}: {:?} ({})", rule.name, link.name, url);
            if merge.insert(&link.name, url) {
                added += 1;
            }
        }
        if added > 0 {
            tracing::debug!("Rule '{}' added {} categories", rule.name, added);
        }
    }

    merge.into_categories()
}

/// Extracts the subcategories listed on a category page
///
/// Both regions are read in order; a URL already seen under this parent is skipped.
pub fn extract_subcategories(document: &Document, site: &SiteConfig) -> Vec<Category> {
    let mut seen = HashSet::new();
    let mut subcategories = Vec::new();

    for rule in SUBCATEGORY_RULES {
        for link in rule.collect(document.root()) {
            let url = normalize_url(&link.href, site.origin());
            if seen.insert(url.clone()) {
                subcategories.push(Category::new(link.name, url));
            }
        }
    }

    subcategories
}

/// Builds the category tree from the live site
#[derive(Debug, Clone)]
pub struct CategoryDiscoverer {
    fetcher: PageFetcher,
    site: Arc<SiteConfig>,
}

impl CategoryDiscoverer {
    pub fn new(fetcher: PageFetcher, site: Arc<SiteConfig>) -> Self {
        Self { fetcher, site }
    }

    /// Fetches the site root, merges every region's categories, then expands
    /// aggregate categories into their subcategories
    ///
    /// Only a failure to fetch the root is an error. A failed subcategory page
    /// is logged and that category keeps an empty subcategory list.
    pub async fn discover(&self, cancel: &CancellationToken) -> Result<Vec<Category>> {
        let root_url = format!("{}/", self.site.origin());
        tracing::info!("Discovering categories from {}", root_url);

        let mut categories = {
            let page = self.fetcher.fetch(&root_url, cancel).await?;
            extract_root_categories(&page.document, &self.site)
        };
        tracing::info!("Found {} top-level categories", categories.len());

        for category in categories.iter_mut() {
            if !is_aggregate_url(&category.url, &self.site) {
                continue;
            }

            match self.subcategories(&category.url, cancel).await {
                Ok(subcategories) => {
                    tracing::debug!(
                        "Found {} subcategories for {}",
                        subcategories.len(),
                        category.name
                    );
                    category.subcategories = subcategories;
                }
                Err(e) if e.is_canceled() => return Err(e),
                Err(e) => {
                    tracing::warn!(url = %category.url, error = %e, "Skipping subcategories");
                }
            }
        }

        Ok(categories)
    }

    async fn subcategories(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<Category>> {
        let page = self.fetcher.fetch(url, cancel).await?;
        Ok(extract_subcategories(&page.document, &self.site))
    }
}
