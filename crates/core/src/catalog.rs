//! Canonical category registry and slug normalization.
//!
//! Legacy question data encodes its category as `main_sub` in one field; the
//! normalizer splits that, applies an explicit subcategory override when one
//! is present, and writes the canonical subcategory slug back onto the
//! question so later lookups are cheap.

use crate::model::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcategoryDef {
    pub name: &'static str,
    pub slug: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDef {
    pub name: &'static str,
    pub slug: &'static str,
    pub subcategories: &'static [SubcategoryDef],
}

const fn sub(name: &'static str, slug: &'static str) -> SubcategoryDef {
    SubcategoryDef { name, slug }
}

/// Every category the game knows about, with display names, in menu order.
pub static CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "Science",
        slug: "science",
        subcategories: &[
            sub("Anatomy", "science__anatomy"),
            sub("Biology", "science__biology"),
            sub("Chemistry", "science__chemistry"),
            sub("Physics", "science__physics"),
        ],
    },
    CategoryDef {
        name: "History",
        slug: "history",
        subcategories: &[
            sub("Ancient Egypt", "history__ancient-egypt"),
            sub("Crime History", "history__crime-history"),
            sub("Revolutionary War", "history__revolutionary-war"),
            sub("Roman Empire", "history__roman-empire"),
            sub("Us", "history__us"),
            sub("World", "history__world"),
            sub("World War 2", "history__world-war-2"),
        ],
    },
    CategoryDef {
        name: "Culture",
        slug: "culture",
        subcategories: &[
            sub("Fashion", "culture__fashion"),
            sub("Movie", "culture__movie"),
            sub("Nineties Culture", "culture__nineties-culture"),
            sub("Reality Tv", "culture__reality-tv"),
            sub("Tv", "culture__tv"),
        ],
    },
    CategoryDef {
        name: "Music",
        slug: "music",
        subcategories: &[
            sub("Beatles", "music__beatles"),
            sub("Eighties", "music__eighties"),
            sub("Nineties Music", "music__nineties-music"),
            sub("Rock", "music__rock"),
        ],
    },
    CategoryDef {
        name: "Geography",
        slug: "geography",
        subcategories: &[
            sub("Us", "geography__us"),
            sub("Us Geography", "geography__us-geography"),
            sub("World", "geography__world"),
            sub("World Geography", "geography__world-geography"),
        ],
    },
    CategoryDef {
        name: "Religion",
        slug: "religion",
        subcategories: &[
            sub("Bible", "religion__bible"),
            sub("Islam", "religion__islam"),
        ],
    },
    CategoryDef {
        name: "Vehicle",
        slug: "vehicle",
        subcategories: &[
            sub("Car Mechanic", "vehicle__car-mechanic"),
            sub("Cdl", "vehicle__cdl"),
            sub("Sailing", "vehicle__sailing"),
        ],
    },
    CategoryDef {
        name: "Sports",
        slug: "sports",
        subcategories: &[
            sub("Baseball", "sports__baseball"),
            sub("Basketball", "sports__basketball"),
            sub("Golf", "sports__golf"),
        ],
    },
    CategoryDef {
        name: "Technology",
        slug: "technology",
        subcategories: &[sub("Windows Os", "technology__windows-os")],
    },
    CategoryDef {
        name: "Humanities",
        slug: "humanities",
        subcategories: &[
            sub("Literature", "humanities__literature"),
            sub("Philosophy", "humanities__philosophy"),
        ],
    },
    CategoryDef {
        name: "Holidays",
        slug: "holidays",
        subcategories: &[sub("Christmas", "holidays__christmas")],
    },
];

/// Resolve a question's raw category data to canonical
/// `(category_slug, subcategory_slug)`.
///
/// The canonical subcategory slug is written back onto the question, so a
/// second call on the same question short-circuits and returns the same
/// pair.
pub fn normalize_question(question: &mut Question) -> (String, String) {
    let (main, split_sub) = split_category(&question.category);
    let category_slug = normalize_segment(&main);

    // Already memoized by a previous call.
    if question
        .sub_category
        .strip_prefix(&category_slug)
        .is_some_and(|rest| rest.starts_with("__"))
    {
        return (category_slug, question.sub_category.clone());
    }

    let sub_raw = if question.sub_category.trim().is_empty() {
        split_sub
    } else {
        question.sub_category.clone()
    };
    let sub_segment = normalize_segment(&sub_raw);
    let sub_slug = if sub_segment.is_empty() {
        String::new()
    } else {
        format!("{category_slug}__{sub_segment}")
    };

    question.sub_category = sub_slug.clone();
    (category_slug, sub_slug)
}

/// Main slug of a category or subcategory slug (`"science__anatomy"` and
/// `"science"` both give `"science"`).
#[must_use]
pub fn main_slug(value: &str) -> String {
    split_slug(value).0
}

/// Subcategory segment of a slug, empty when there is none.
#[must_use]
pub fn sub_segment(value: &str) -> String {
    split_slug(value).1
}

/// Registry spelling of a subcategory slug, matched case-insensitively.
#[must_use]
pub fn canonical_subcategory(slug: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .flat_map(|category| category.subcategories)
        .find(|def| def.slug.eq_ignore_ascii_case(slug))
        .map(|def| def.slug)
}

/// Display name for a category slug, falling back to title case.
#[must_use]
pub fn category_display(slug: &str) -> String {
    let main = main_slug(slug);
    CATEGORIES
        .iter()
        .find(|category| category.slug.eq_ignore_ascii_case(&main))
        .map_or_else(|| to_title(slug), |category| category.name.to_string())
}

/// Display name for a subcategory slug, falling back to title case of its
/// sub segment.
#[must_use]
pub fn subcategory_display(slug: &str) -> String {
    if let Some(def) = CATEGORIES
        .iter()
        .flat_map(|category| category.subcategories)
        .find(|def| def.slug.eq_ignore_ascii_case(slug))
    {
        return def.name.to_string();
    }

    let segment = sub_segment(slug);
    if segment.is_empty() {
        to_title(slug)
    } else {
        to_title(&segment)
    }
}

/// Split legacy `main_sub` category text on its first underscore.
fn split_category(category: &str) -> (String, String) {
    let mut parts = category
        .splitn(2, '_')
        .map(str::trim)
        .filter(|part| !part.is_empty());
    let main = parts.next().unwrap_or_default().to_string();
    let sub = parts.next().unwrap_or_default().to_string();
    (main, sub)
}

/// Split a canonical slug on its `__` separator, normalizing both halves.
fn split_slug(slug: &str) -> (String, String) {
    let mut parts = slug
        .splitn(2, "__")
        .map(str::trim)
        .filter(|part| !part.is_empty());
    let main = normalize_segment(parts.next().unwrap_or_default());
    let sub = normalize_segment(parts.next().unwrap_or_default());
    (main, sub)
}

/// Lowercase a segment, turning spaces and underscores into hyphens and
/// trimming stray separators.
fn normalize_segment(value: &str) -> String {
    let replaced: String = value
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect();
    replaced.to_lowercase().trim_matches('-').to_string()
}

fn to_title(value: &str) -> String {
    value
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
