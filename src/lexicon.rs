//! Detection tables shared by the enrichment classifiers and the price estimator.
//!
//! The lexicon is loaded once at startup, either from the compiled-in defaults or from a YAML
//! document named by `LEXICON_PATH`, and handed to each classifier behind an `Arc`. Table
//! order is significant: ties resolve to the entry declared first.

use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("unable to read lexicon file: {0}")]
    Io(String),
    #[error("invalid lexicon document: {0}")]
    Parse(String),
    #[error("invalid model pattern for `{brand}`: {message}")]
    Pattern { brand: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub brands: Vec<BrandEntry>,
    pub display_names: BTreeMap<String, String>,
    pub model_patterns: Vec<ModelPattern>,
    pub fuzzy_brands: Vec<String>,
    pub materials: Vec<MaterialEntry>,
    pub styles: StyleTaxonomy,
    pub construction: ConstructionTaxonomy,
    pub category_terms: Vec<KeywordValue<String>>,
    pub shipping_costs: Vec<KeywordValue<f64>>,
    pub default_shipping_cost: f64,
    pub base_prices: Vec<KeywordValue<f64>>,
    pub default_base_price: f64,
    pub brand_premiums: Vec<KeywordValue<f64>>,
    pub known_brand_multiplier: f64,
}

/// A brand the direct matcher knows about. `variations[0]` is the primary form.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandEntry {
    pub name: String,
    pub variations: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub identifiers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPattern {
    pub brand: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialEntry {
    pub label: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub subtypes: Vec<MaterialSubtype>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialSubtype {
    pub label: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StyleTaxonomy {
    pub clothing_keywords: Vec<String>,
    pub electronics_keywords: Vec<String>,
    pub furniture: Vec<StyleEntry>,
    pub clothing: Vec<StyleEntry>,
    pub electronics: Vec<StyleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleEntry {
    pub label: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub material_hints: Vec<String>,
    #[serde(default)]
    pub construction_hints: Vec<String>,
    #[serde(default)]
    pub brand_hints: Vec<String>,
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConstructionTaxonomy {
    pub furniture_keywords: Vec<String>,
    pub methods: Vec<ConstructionMethod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstructionMethod {
    pub label: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub typical_items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordValue<T> {
    pub keyword: String,
    pub value: T,
}

impl Lexicon {
    pub fn from_env() -> Result<Self, LexiconError> {
        match std::env::var("LEXICON_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::from_path(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let raw = std::fs::read_to_string(path).map_err(|err| LexiconError::Io(err.to_string()))?;
        let lexicon = Self::from_yaml(&raw)?;
        info!(
            target = "hermes.pipeline",
            path = %path.display(),
            brands = lexicon.brands.len(),
            materials = lexicon.materials.len(),
            "lexicon loaded"
        );
        Ok(lexicon)
    }

    /// Tables absent from the document keep their built-in values.
    pub fn from_yaml(raw: &str) -> Result<Self, LexiconError> {
        serde_yaml::from_str::<Self>(raw)
            .map(Self::lowercased)
            .map_err(|err| LexiconError::Parse(err.to_string()))
    }

    /// Match keywords are compared against lowercased text. Labels, display
    /// values and model regexes keep their case.
    fn lowercased(mut self) -> Self {
        for brand in &mut self.brands {
            lowercase_all(&mut brand.variations);
            lowercase_all(&mut brand.categories);
            lowercase_all(&mut brand.identifiers);
        }
        self.display_names = std::mem::take(&mut self.display_names)
            .into_iter()
            .map(|(key, name)| (key.to_lowercase(), name))
            .collect();
        lowercase_all(&mut self.fuzzy_brands);
        for material in &mut self.materials {
            lowercase_all(&mut material.patterns);
            for subtype in &mut material.subtypes {
                lowercase_all(&mut subtype.patterns);
            }
        }
        lowercase_all(&mut self.styles.clothing_keywords);
        lowercase_all(&mut self.styles.electronics_keywords);
        for entry in self
            .styles
            .furniture
            .iter_mut()
            .chain(self.styles.clothing.iter_mut())
            .chain(self.styles.electronics.iter_mut())
        {
            lowercase_all(&mut entry.patterns);
            lowercase_all(&mut entry.material_hints);
            lowercase_all(&mut entry.construction_hints);
            lowercase_all(&mut entry.brand_hints);
            lowercase_all(&mut entry.indicators);
        }
        lowercase_all(&mut self.construction.furniture_keywords);
        for method in &mut self.construction.methods {
            lowercase_all(&mut method.patterns);
            lowercase_all(&mut method.indicators);
            lowercase_all(&mut method.typical_items);
        }
        lowercase_keywords(&mut self.category_terms);
        lowercase_keywords(&mut self.shipping_costs);
        lowercase_keywords(&mut self.base_prices);
        lowercase_keywords(&mut self.brand_premiums);
        self
    }

    pub fn display_name(&self, key: &str) -> String {
        let lowered = key.trim().to_lowercase();
        if let Some(special) = self.display_names.get(&lowered) {
            return special.clone();
        }
        title_case(&lowered)
    }

    /// First table entry whose keyword occurs in `text`.
    pub fn lookup<'a, T>(table: &'a [KeywordValue<T>], text: &str) -> Option<&'a T> {
        let lowered = text.to_lowercase();
        table
            .iter()
            .find(|entry| lowered.contains(&entry.keyword))
            .map(|entry| &entry.value)
    }

    pub fn is_furniture(&self, category: &str) -> bool {
        contains_any(category, &self.construction.furniture_keywords)
    }

    pub fn is_electronics(&self, category: &str) -> bool {
        contains_any(category, &self.styles.electronics_keywords)
    }

    pub fn is_clothing(&self, category: &str) -> bool {
        contains_any(category, &self.styles.clothing_keywords)
    }
}

fn lowercase_all(values: &mut [String]) {
    for value in values {
        *value = value.to_lowercase();
    }
}

fn lowercase_keywords<T>(table: &mut [KeywordValue<T>]) {
    for entry in table {
        entry.keyword = entry.keyword.to_lowercase();
    }
}

pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
}

/// Title-cases each word, splitting on spaces, hyphens and underscores.
/// Underscores become spaces; hyphens are kept.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.trim().chars() {
        match ch {
            ' ' | '_' => {
                out.push(' ');
                at_word_start = true;
            }
            '-' => {
                out.push('-');
                at_word_start = true;
            }
            _ if at_word_start => {
                out.extend(ch.to_uppercase());
                at_word_start = false;
            }
            _ => out.extend(ch.to_lowercase()),
        }
    }
    out
}

fn s(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn kv<T: Clone>(pairs: &[(&str, T)]) -> Vec<KeywordValue<T>> {
    pairs
        .iter()
        .map(|(keyword, value)| KeywordValue {
            keyword: keyword.to_string(),
            value: value.clone(),
        })
        .collect()
}

fn brand(name: &str, variations: &[&str], categories: &[&str], identifiers: &[&str]) -> BrandEntry {
    BrandEntry {
        name: name.to_string(),
        variations: s(variations),
        categories: s(categories),
        identifiers: s(identifiers),
    }
}

/// Subtype patterns are `|`-separated.
fn material(label: &str, patterns: &[&str], subtypes: &[(&str, &str)]) -> MaterialEntry {
    MaterialEntry {
        label: label.to_string(),
        patterns: s(patterns),
        subtypes: subtypes
            .iter()
            .map(|(label, patterns)| MaterialSubtype {
                label: label.to_string(),
                patterns: patterns.split('|').map(str::to_string).collect(),
            })
            .collect(),
    }
}

fn style(
    label: &str,
    patterns: &[&str],
    material_hints: &[&str],
    construction_hints: &[&str],
    brand_hints: &[&str],
    indicators: &[&str],
) -> StyleEntry {
    StyleEntry {
        label: label.to_string(),
        patterns: s(patterns),
        material_hints: s(material_hints),
        construction_hints: s(construction_hints),
        brand_hints: s(brand_hints),
        indicators: s(indicators),
    }
}

fn method(
    label: &str,
    patterns: &[&str],
    indicators: &[&str],
    typical_items: &[&str],
) -> ConstructionMethod {
    ConstructionMethod {
        label: label.to_string(),
        patterns: s(patterns),
        indicators: s(indicators),
        typical_items: s(typical_items),
    }
}

const FOOTWEAR: &[&str] = &["footwear", "shoe", "sneaker", "boot", "apparel", "clothing"];
const FURNITURE: &[&str] = &[
    "furniture", "chair", "table", "desk", "dresser", "shelf", "bookcase", "sofa", "couch",
];
const ELECTRONICS: &[&str] = &[
    "electronics", "phone", "laptop", "computer", "tablet", "camera", "headphone", "console", "tv",
];

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            brands: vec![
                brand(
                    "nike",
                    &["nike", "nike air", "swoosh"],
                    FOOTWEAR,
                    &["air max", "air jordan", "air force", "just do it", "dri-fit"],
                ),
                brand(
                    "adidas",
                    &["adidas", "three stripes"],
                    FOOTWEAR,
                    &["ultraboost", "superstar", "stan smith", "trefoil"],
                ),
                brand(
                    "apple",
                    &["apple", "iphone", "ipad", "macbook", "imac", "airpods"],
                    ELECTRONICS,
                    &["designed by apple", "retina", "lightning"],
                ),
                brand(
                    "samsung",
                    &["samsung", "galaxy"],
                    ELECTRONICS,
                    &["one ui", "amoled"],
                ),
                brand(
                    "sony",
                    &["sony", "playstation", "walkman"],
                    ELECTRONICS,
                    &["bravia", "cyber-shot", "wh-1000"],
                ),
                brand(
                    "nintendo",
                    &["nintendo", "game boy"],
                    ELECTRONICS,
                    &["joy-con", "switch"],
                ),
                brand(
                    "canon",
                    &["canon"],
                    ELECTRONICS,
                    &["eos", "powershot", "rebel"],
                ),
                brand(
                    "hp",
                    &["hewlett-packard", "hewlett packard", "hp inc"],
                    ELECTRONICS,
                    &["pavilion", "elitebook", "laserjet"],
                ),
                brand(
                    "ikea",
                    &["ikea"],
                    FURNITURE,
                    &["kallax", "hemnes", "malm", "billy", "poang"],
                ),
                brand(
                    "herman miller",
                    &["herman miller", "hermanmiller"],
                    FURNITURE,
                    &["aeron", "eames", "embody", "zeeland"],
                ),
                brand(
                    "west elm",
                    &["west elm", "westelm"],
                    FURNITURE,
                    &["mid-century", "williams-sonoma"],
                ),
                brand(
                    "pottery barn",
                    &["pottery barn"],
                    FURNITURE,
                    &["williams-sonoma"],
                ),
                brand(
                    "la-z-boy",
                    &["la-z-boy", "la z boy", "lazboy"],
                    &["furniture", "recliner", "chair", "sofa"],
                    &["recliner"],
                ),
                brand(
                    "levi's",
                    &["levi's", "levis", "levi strauss"],
                    &["clothing", "jeans", "denim", "apparel"],
                    &["501", "505", "red tab"],
                ),
                brand(
                    "patagonia",
                    &["patagonia"],
                    &["clothing", "jacket", "outdoor", "apparel", "fleece"],
                    &["synchilla", "better sweater", "nano puff"],
                ),
                brand(
                    "the north face",
                    &["the north face", "north face"],
                    &["clothing", "jacket", "outdoor", "apparel"],
                    &["nuptse", "denali", "summit series"],
                ),
                brand(
                    "coach",
                    &["coach"],
                    &["bag", "purse", "handbag", "wallet", "accessories"],
                    &["est. 1941", "creed", "signature canvas"],
                ),
                brand(
                    "kitchenaid",
                    &["kitchenaid", "kitchen aid"],
                    &["appliance", "kitchen", "mixer"],
                    &["artisan", "stand mixer"],
                ),
                brand(
                    "lego",
                    &["lego"],
                    &["toy", "toys", "building"],
                    &["minifigure", "technic"],
                ),
            ],
            display_names: [
                ("ikea", "IKEA"),
                ("hp", "HP"),
                ("lg", "LG"),
                ("jbl", "JBL"),
                ("lego", "LEGO"),
                ("h&m", "H&M"),
                ("levi's", "Levi's"),
                ("levis", "Levi's"),
                ("kitchenaid", "KitchenAid"),
                ("la-z-boy", "La-Z-Boy"),
                ("the north face", "The North Face"),
                ("playstation", "PlayStation"),
            ]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
            model_patterns: [
                ("apple", r"^A\d{4}$"),
                ("samsung", r"^(SM|GT)-[A-Z0-9]{3,}$"),
                ("sony", r"^(WH|WF|MDR|DSC|ILCE|CFI)-[A-Z0-9]{3,}$"),
                ("nintendo", r"^(HAC|HEG|RVL|NTR|CTR)-\d{3}$"),
                ("dell", r"^P\d{2}[A-Z]$"),
                ("kitchenaid", r"^K(SM|HM)\d{2,3}[A-Z]*$"),
            ]
            .into_iter()
            .map(|(brand, pattern)| ModelPattern {
                brand: brand.to_string(),
                pattern: pattern.to_string(),
            })
            .collect(),
            fuzzy_brands: s(&[
                "adidas",
                "samsung",
                "nintendo",
                "lenovo",
                "reebok",
                "patagonia",
                "kitchenaid",
                "gucci",
                "prada",
                "dyson",
            ]),
            materials: vec![
                material(
                    "Wood",
                    &["wood", "wooden", "timber", "hardwood"],
                    &[
                        ("Walnut", "walnut"),
                        ("Oak", "oak"),
                        ("Maple", "maple"),
                        ("Cherry", "cherry"),
                        ("Teak", "teak"),
                        ("Mahogany", "mahogany"),
                        ("Pine", "pine"),
                        ("Birch", "birch"),
                        ("Rosewood", "rosewood"),
                    ],
                ),
                material(
                    "Engineered Wood",
                    &["particleboard", "particle board", "mdf", "laminate"],
                    &[("Wood Veneer", "veneer")],
                ),
                material(
                    "Metal",
                    &["metal", "steel", "iron", "aluminum", "aluminium", "chrome", "brass"],
                    &[
                        ("Stainless Steel", "stainless steel|stainless"),
                        ("Cast Iron", "cast iron"),
                        ("Wrought Iron", "wrought iron"),
                    ],
                ),
                material(
                    "Leather",
                    &["leather", "suede"],
                    &[
                        ("Full-Grain Leather", "full-grain|full grain"),
                        ("Top-Grain Leather", "top-grain|top grain"),
                        ("Faux Leather", "faux leather|vegan leather|pleather"),
                    ],
                ),
                material(
                    "Fabric",
                    &["fabric", "upholster", "textile", "cloth"],
                    &[
                        ("Cotton", "cotton"),
                        ("Linen", "linen"),
                        ("Velvet", "velvet"),
                        ("Wool", "wool"),
                        ("Denim", "denim"),
                        ("Polyester", "polyester"),
                        ("Silk", "silk"),
                    ],
                ),
                material(
                    "Glass",
                    &["glass"],
                    &[("Tempered Glass", "tempered glass"), ("Crystal", "crystal")],
                ),
                material(
                    "Plastic",
                    &["plastic", "vinyl", "polymer"],
                    &[("Acrylic", "acrylic|lucite")],
                ),
                material(
                    "Ceramic",
                    &["ceramic", "porcelain", "stoneware", "earthenware"],
                    &[],
                ),
                material(
                    "Wicker",
                    &["wicker", "rattan"],
                    &[],
                ),
                material(
                    "Stone",
                    &["stone", "marble", "granite"],
                    &[("Carrara Marble", "carrara")],
                ),
            ],
            styles: StyleTaxonomy {
                clothing_keywords: s(&[
                    "clothing", "apparel", "shirt", "dress", "jacket", "coat", "jeans", "pants",
                    "sweater", "hoodie", "footwear", "shoe", "sneaker", "boot",
                ]),
                electronics_keywords: s(ELECTRONICS),
                furniture: vec![
                    style(
                        "Mid-Century Modern",
                        &["mid-century", "mid century", "midcentury", "mcm", "atomic"],
                        &["walnut", "teak", "rosewood"],
                        &["tapered legs", "splayed legs", "dovetail"],
                        &["herman miller", "knoll", "west elm", "broyhill"],
                        &["tapered", "retro", "organic", "minimal"],
                    ),
                    style(
                        "Farmhouse",
                        &["farmhouse", "rustic", "shiplap"],
                        &["pine", "oak", "reclaimed"],
                        &["distressed", "plank"],
                        &["pottery barn", "magnolia"],
                        &["weathered", "cottage", "vintage"],
                    ),
                    style(
                        "Scandinavian",
                        &["scandinavian", "nordic", "danish", "swedish"],
                        &["birch", "pine", "beech"],
                        &["flat-pack", "bentwood"],
                        &["ikea", "muuto"],
                        &["minimal", "light", "clean lines", "simple"],
                    ),
                    style(
                        "Industrial",
                        &["industrial", "loft", "factory"],
                        &["iron", "steel", "metal"],
                        &["welded", "riveted"],
                        &["restoration hardware"],
                        &["raw", "exposed", "distressed"],
                    ),
                    style(
                        "Traditional",
                        &["traditional", "queen anne", "chippendale", "victorian", "colonial"],
                        &["mahogany", "cherry", "oak"],
                        &["carved", "claw foot", "turned legs"],
                        &["ethan allen", "thomasville", "drexel"],
                        &["ornate", "classic", "antique", "formal"],
                    ),
                    style(
                        "Modern",
                        &["modern", "contemporary"],
                        &["glass", "steel", "acrylic"],
                        &["cantilever"],
                        &["design within reach", "cb2"],
                        &["sleek", "minimal", "glossy"],
                    ),
                ],
                clothing: vec![
                    style(
                        "Streetwear",
                        &["streetwear", "graphic tee", "oversized"],
                        &["cotton", "fleece"],
                        &["screen print", "embroidered"],
                        &["supreme", "bape", "stussy", "off-white"],
                        &["logo", "graphic", "limited"],
                    ),
                    style(
                        "Athleisure",
                        &["athletic", "athleisure", "performance", "running", "training"],
                        &["polyester", "spandex", "nylon"],
                        &["moisture-wicking", "seamless"],
                        &["lululemon", "nike", "adidas", "under armour"],
                        &["stretch", "sport", "gym"],
                    ),
                    style(
                        "Vintage",
                        &["vintage", "retro", "70s", "80s", "90s"],
                        &["denim", "wool"],
                        &["single stitch", "union made", "selvedge"],
                        &["levi's", "pendleton"],
                        &["faded", "classic"],
                    ),
                    style(
                        "Formal",
                        &["formal", "suit", "blazer", "tuxedo", "evening"],
                        &["wool", "silk"],
                        &["tailored", "fully lined"],
                        &["hugo boss", "brooks brothers"],
                        &["elegant", "dress"],
                    ),
                    style(
                        "Outdoor",
                        &["outdoor", "hiking", "technical", "waterproof"],
                        &["fleece", "nylon", "down"],
                        &["taped seams", "insulated"],
                        &["patagonia", "the north face", "arc'teryx", "columbia"],
                        &["warm", "shell", "packable"],
                    ),
                ],
                electronics: vec![
                    style(
                        "Retro Gaming",
                        &["retro", "8-bit", "16-bit", "classic console"],
                        &["plastic"],
                        &["cartridge"],
                        &["nintendo", "sega", "atari"],
                        &["console", "controller", "game"],
                    ),
                    style(
                        "Audiophile",
                        &["audiophile", "hi-fi", "hifi", "high fidelity"],
                        &["wood", "aluminum"],
                        &["vacuum tube", "tube amp"],
                        &["sennheiser", "marantz", "mcintosh", "bose"],
                        &["stereo", "amplifier", "speaker"],
                    ),
                    style(
                        "Professional",
                        &["professional", "studio", "workstation"],
                        &["aluminum", "metal"],
                        &["unibody"],
                        &["apple", "sony", "canon"],
                        &["high-end", "performance"],
                    ),
                    style(
                        "Minimalist",
                        &["minimalist", "compact", "slim"],
                        &["glass", "aluminum"],
                        &["wireless"],
                        &["bang & olufsen"],
                        &["sleek", "clean", "portable"],
                    ),
                ],
            },
            construction: ConstructionTaxonomy {
                furniture_keywords: s(&[
                    "furniture", "chair", "table", "desk", "dresser", "cabinet", "sofa", "couch",
                    "bed", "shelf", "bookcase", "nightstand", "stool", "bench", "ottoman",
                    "armoire", "credenza", "sideboard", "chest", "recliner",
                ]),
                methods: vec![
                    method(
                        "Dovetail Joinery",
                        &["dovetail"],
                        &["hand-cut", "joinery", "drawer"],
                        &["dresser", "drawer", "chest", "cabinet", "nightstand"],
                    ),
                    method(
                        "Mortise and Tenon",
                        &["mortise", "tenon"],
                        &["joinery", "pegged", "solid wood"],
                        &["table", "chair", "bed", "bench"],
                    ),
                    method(
                        "Flat-Pack",
                        &["flat-pack", "flat pack", "self-assembly", "ready to assemble", "cam lock"],
                        &["assembly", "particleboard", "allen key", "hardware included"],
                        &["bookcase", "shelf", "desk", "dresser"],
                    ),
                    method(
                        "Upholstered",
                        &["upholstered", "upholstery", "tufted", "cushioned"],
                        &["fabric", "springs", "foam", "padded"],
                        &["sofa", "couch", "chair", "ottoman", "headboard", "recliner"],
                    ),
                    method(
                        "Bentwood",
                        &["bentwood", "bent wood", "steam-bent"],
                        &["curved", "thonet"],
                        &["chair", "rocker", "stool"],
                    ),
                    method(
                        "Welded",
                        &["welded", "welding"],
                        &["steel", "iron", "metal frame"],
                        &["table", "stool", "shelf"],
                    ),
                    method(
                        "Woven",
                        &["woven", "wicker", "rattan", "caned"],
                        &["weave", "natural fiber"],
                        &["chair", "basket", "headboard"],
                    ),
                ],
            },
            category_terms: kv(&[
                ("chair", "chair".to_string()),
                ("sofa", "sofa".to_string()),
                ("couch", "sofa".to_string()),
                ("table", "table".to_string()),
                ("desk", "desk".to_string()),
                ("dresser", "dresser".to_string()),
                ("bookcase", "bookcase".to_string()),
                ("shelf", "shelf".to_string()),
                ("lamp", "lamp".to_string()),
                ("jacket", "jacket".to_string()),
                ("coat", "coat".to_string()),
                ("jeans", "jeans".to_string()),
                ("sneaker", "sneakers".to_string()),
                ("shoe", "shoes".to_string()),
                ("boot", "boots".to_string()),
                ("dress", "dress".to_string()),
                ("phone", "phone".to_string()),
                ("laptop", "laptop".to_string()),
                ("camera", "camera".to_string()),
                ("headphone", "headphones".to_string()),
                ("console", "console".to_string()),
                ("watch", "watch".to_string()),
                ("handbag", "handbag".to_string()),
                ("purse", "purse".to_string()),
                ("mixer", "mixer".to_string()),
            ]),
            shipping_costs: kv(&[
                ("sofa", 150.0),
                ("couch", 150.0),
                ("dresser", 120.0),
                ("bookcase", 90.0),
                ("table", 90.0),
                ("desk", 90.0),
                ("chair", 45.0),
                ("laptop", 18.0),
                ("console", 18.0),
                ("camera", 14.0),
                ("phone", 9.0),
                ("sneaker", 13.0),
                ("shoe", 13.0),
                ("jacket", 10.0),
                ("jeans", 8.0),
                ("shirt", 6.0),
            ]),
            default_shipping_cost: 15.0,
            base_prices: kv(&[
                ("sofa", 180.0),
                ("couch", 180.0),
                ("dresser", 140.0),
                ("table", 90.0),
                ("desk", 80.0),
                ("chair", 45.0),
                ("bookcase", 55.0),
                ("lamp", 25.0),
                ("laptop", 260.0),
                ("phone", 160.0),
                ("camera", 140.0),
                ("console", 120.0),
                ("headphone", 45.0),
                ("sneaker", 45.0),
                ("shoe", 35.0),
                ("jacket", 40.0),
                ("coat", 45.0),
                ("jeans", 22.0),
                ("dress", 25.0),
                ("shirt", 12.0),
                ("handbag", 60.0),
                ("watch", 50.0),
            ]),
            default_base_price: 20.0,
            brand_premiums: kv(&[
                ("herman miller", 4.0),
                ("gucci", 5.0),
                ("prada", 4.0),
                ("apple", 1.8),
                ("patagonia", 1.6),
                ("kitchenaid", 1.5),
                ("nike", 1.3),
                ("sony", 1.3),
                ("adidas", 1.2),
                ("ikea", 0.7),
            ]),
            known_brand_multiplier: 1.15,
        }
    }
}
