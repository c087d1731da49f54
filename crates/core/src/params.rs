//! search query encoding.
//!
//! a [`SearchOptions`] value describes a query semantically; [`encode`] turns it
//! into the flat key/value pairs sent on the wire. each option is resolved on its
//! own through a [`SearchParameter`] and only options that resolve to a value
//! end up in the output.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::debug;

use crate::errors::{CoreError, Result};

/// wire-level query parameters, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

pub const RESOLUTIONS: &[&str] = &[
    "1024x768",
    "1280x800",
    "1366x768",
    "1280x960",
    "1440x900",
    "1600x900",
    "1280x1024",
    "1600x1200",
    "1680x1050",
    "1920x1080",
    "1920x1200",
    "2560x1440",
    "2560x1600",
    "3840x1080",
    "5760x1080",
    "3840x2160",
];

pub const RATIOS: &[&str] = &["4x3", "5x4", "16x9", "16x10", "21x9", "32x9", "48x9"];

pub const SORTINGS: &[&str] = &["relevance", "random", "date_added", "views", "favorites"];

pub const ORDERS: &[&str] = &["asc", "desc"];

/// a named boolean flag packed into a [`SearchParameter::WeightedBitmask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    pub name: &'static str,
    pub weight: u32,
    pub active: bool,
}

impl Flag {
    pub const fn new(name: &'static str, weight: u32, active: bool) -> Self {
        Self {
            name,
            weight,
            active,
        }
    }
}

/// one search parameter, before it is resolved to its wire value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchParameter {
    /// the given value, or `default` when none was given.
    ScalarOrDefault {
        name: &'static str,
        value: Option<String>,
        default: Option<&'static str>,
    },
    /// the given value if it is one of `choices`, otherwise `default`.
    ChoiceOrDefault {
        name: &'static str,
        value: Option<String>,
        choices: &'static [&'static str],
        default: Option<&'static str>,
    },
    /// comma-joined values; every value must be one of `choices`.
    MultiChoiceList {
        name: &'static str,
        values: Vec<String>,
        choices: &'static [&'static str],
    },
    /// sum of the active flag weights as a binary string, one digit per flag.
    WeightedBitmask {
        name: &'static str,
        flags: Vec<Flag>,
    },
}

impl SearchParameter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScalarOrDefault { name, .. }
            | Self::ChoiceOrDefault { name, .. }
            | Self::MultiChoiceList { name, .. }
            | Self::WeightedBitmask { name, .. } => *name,
        }
    }

    /// resolves the wire value. `None` means the parameter is left off the request.
    pub fn resolve(&self) -> Result<Option<String>> {
        match self {
            Self::ScalarOrDefault { value, default, .. } => Ok(value
                .as_deref()
                .filter(|v| !v.is_empty())
                .or(*default)
                .map(str::to_string)),
            Self::ChoiceOrDefault {
                name,
                value,
                choices,
                default,
            } => {
                let chosen = value.as_deref().filter(|v| choices.contains(v));
                if chosen.is_none()
                    && let Some(rejected) = value
                {
                    debug!(parameter = *name, value = %rejected, "unknown choice; using default");
                }
                Ok(chosen.or(*default).map(str::to_string))
            }
            Self::MultiChoiceList {
                name,
                values,
                choices,
            } => {
                if values.is_empty() {
                    return Ok(None);
                }

                if let Some(bad) = values.iter().find(|v| !choices.contains(&v.as_str())) {
                    return Err(CoreError::InvalidChoice {
                        name: *name,
                        value: bad.clone(),
                    });
                }

                Ok(Some(values.join(",")))
            }
            Self::WeightedBitmask { flags, .. } => {
                let sum: u32 = flags.iter().filter(|f| f.active).map(|f| f.weight).sum();
                Ok(Some(format!("{sum:0width$b}", width = flags.len())))
            }
        }
    }
}

/// content categories to include in a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories {
    pub general: bool,
    pub anime: bool,
    pub people: bool,
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            general: true,
            anime: true,
            people: true,
        }
    }
}

impl Categories {
    pub fn parameter(&self) -> SearchParameter {
        SearchParameter::WeightedBitmask {
            name: "categories",
            flags: vec![
                Flag::new("general", 4, self.general),
                Flag::new("anime", 2, self.anime),
                Flag::new("people", 1, self.people),
            ],
        }
    }
}

/// content purity levels to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purity {
    pub sfw: bool,
    pub sketchy: bool,
    pub nsfw: bool,
}

impl Default for Purity {
    fn default() -> Self {
        Self {
            sfw: true,
            sketchy: false,
            nsfw: false,
        }
    }
}

impl Purity {
    pub fn parameter(&self) -> SearchParameter {
        SearchParameter::WeightedBitmask {
            name: "purity",
            flags: vec![
                Flag::new("sfw", 4, self.sfw),
                Flag::new("sketchy", 2, self.sketchy),
                Flag::new("nsfw", 1, self.nsfw),
            ],
        }
    }
}

/// semantic description of a listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub categories: Categories,
    pub purity: Purity,
    pub resolutions: Vec<String>,
    pub ratios: Vec<String>,
    pub sorting: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn categories(mut self, categories: Categories) -> Self {
        self.categories = categories;
        self
    }

    pub fn purity(mut self, purity: Purity) -> Self {
        self.purity = purity;
        self
    }

    pub fn resolutions<I, S>(mut self, resolutions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolutions = resolutions.into_iter().map(Into::into).collect();
        self
    }

    pub fn ratios<I, S>(mut self, ratios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ratios = ratios.into_iter().map(Into::into).collect();
        self
    }

    pub fn sorting(mut self, sorting: impl Into<String>) -> Self {
        self.sorting = Some(sorting.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    fn query_parameter(&self) -> SearchParameter {
        SearchParameter::ScalarOrDefault {
            name: "q",
            value: self.query.clone(),
            default: None,
        }
    }

    fn page_parameter(&self) -> SearchParameter {
        SearchParameter::ScalarOrDefault {
            name: "page",
            value: self.page.filter(|p| *p > 0).map(|p| p.to_string()),
            default: Some("1"),
        }
    }

    fn search_parameters(&self) -> Vec<SearchParameter> {
        vec![
            self.query_parameter(),
            self.categories.parameter(),
            self.purity.parameter(),
            SearchParameter::MultiChoiceList {
                name: "resolutions",
                values: self.resolutions.clone(),
                choices: RESOLUTIONS,
            },
            SearchParameter::MultiChoiceList {
                name: "ratios",
                values: self.ratios.clone(),
                choices: RATIOS,
            },
            SearchParameter::ChoiceOrDefault {
                name: "sorting",
                value: self.sorting.clone(),
                choices: SORTINGS,
                default: Some("relevance"),
            },
            SearchParameter::ChoiceOrDefault {
                name: "order",
                value: self.order.clone(),
                choices: ORDERS,
                default: Some("desc"),
            },
            self.page_parameter(),
        ]
    }

    fn user_parameters(&self) -> Vec<SearchParameter> {
        vec![self.purity.parameter(), self.page_parameter()]
    }
}

/// which parameter set a listing route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Search,
    User,
}

impl RouteKind {
    /// classifies a listing url by its path.
    pub fn detect(route: &str) -> Result<Self> {
        let path = reqwest::Url::parse(route)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| route.to_string());

        if path.contains("search") {
            Ok(Self::Search)
        } else if path.contains("user") || path.contains("favorites") {
            Ok(Self::User)
        } else {
            Err(CoreError::InvalidRoute {
                route: route.to_string(),
            })
        }
    }
}

impl FromStr for RouteKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(Self::Search),
            "user" => Ok(Self::User),
            _ => Err(CoreError::InvalidRoute {
                route: s.to_string(),
            }),
        }
    }
}

/// encodes `options` into the query parameters accepted by `kind` routes.
///
/// fails with [`CoreError::InvalidChoice`] before any request is made when a
/// resolution or ratio is not on its allow-list.
pub fn encode(kind: RouteKind, options: &SearchOptions) -> Result<Params> {
    let parameters = match kind {
        RouteKind::Search => options.search_parameters(),
        RouteKind::User => options.user_parameters(),
    };

    let mut params = Params::new();
    for parameter in &parameters {
        if let Some(value) = parameter.resolve()? {
            params.insert(parameter.name().to_string(), value);
        }
    }

    Ok(params)
}

/// like [`encode`], with the route kind detected from the listing url.
pub fn encode_for_route(route: &str, options: &SearchOptions) -> Result<Params> {
    encode(RouteKind::detect(route)?, options)
}
