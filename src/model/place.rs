use super::*;

/// A node of the geographic hierarchy, identified by an external id unique within its level.
pub trait Place {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Name of the hierarchy level, used in diagnostics.
    fn level() -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub localized_name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub localized_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct SubRegion {
    pub id: String,
    pub name: String,
    pub localized_name: String,
}

macro_rules! impl_place {
    ($place:ty, $level:literal) => {
        impl Place for $place {
            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn level() -> &'static str {
                $level
            }
        }
    };
}

impl_place!(Country, "country");
impl_place!(Region, "region");
impl_place!(SubRegion, "sub_region");
