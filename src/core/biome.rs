use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Biome {
    #[default]
    Plains,
    Forest,
    Desert,
    Tundra,
    Mountains,
    Swamp,
    Ocean,
    Beach,
    River,
    Lake,
    Island,
}

/// Coarse biome tags, matched through the `$` prefix in biome expressions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BiomeCategory {
    Plains,
    Forest,
    Sandy,
    Cold,
    Hot,
    Wet,
    Mountain,
    Water,
}

impl Biome {
    pub fn all() -> &'static [Biome] {
        &[
            Biome::Plains,
            Biome::Forest,
            Biome::Desert,
            Biome::Tundra,
            Biome::Mountains,
            Biome::Swamp,
            Biome::Ocean,
            Biome::Beach,
            Biome::River,
            Biome::Lake,
            Biome::Island,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Biome::Plains => "Plains",
            Biome::Forest => "Forest",
            Biome::Desert => "Desert",
            Biome::Tundra => "Tundra",
            Biome::Mountains => "Mountains",
            Biome::Swamp => "Swamp",
            Biome::Ocean => "Ocean",
            Biome::Beach => "Beach",
            Biome::River => "River",
            Biome::Lake => "Lake",
            Biome::Island => "Island",
        }
    }

    pub fn categories(&self) -> &'static [BiomeCategory] {
        match self {
            Biome::Plains => &[BiomeCategory::Plains],
            Biome::Forest => &[BiomeCategory::Forest],
            Biome::Desert => &[BiomeCategory::Sandy, BiomeCategory::Hot],
            Biome::Tundra => &[BiomeCategory::Cold],
            Biome::Mountains => &[BiomeCategory::Mountain, BiomeCategory::Cold],
            Biome::Swamp => &[BiomeCategory::Wet],
            Biome::Ocean => &[BiomeCategory::Water],
            Biome::Beach => &[BiomeCategory::Sandy],
            Biome::River => &[BiomeCategory::Water],
            Biome::Lake => &[BiomeCategory::Water],
            Biome::Island => &[BiomeCategory::Plains, BiomeCategory::Water],
        }
    }

    pub fn is_of_category(&self, category: BiomeCategory) -> bool {
        self.categories().contains(&category)
    }
}

impl BiomeCategory {
    pub fn from_name(name: &str) -> Option<BiomeCategory> {
        let categories = [
            BiomeCategory::Plains,
            BiomeCategory::Forest,
            BiomeCategory::Sandy,
            BiomeCategory::Cold,
            BiomeCategory::Hot,
            BiomeCategory::Wet,
            BiomeCategory::Mountain,
            BiomeCategory::Water,
        ];
        categories
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            BiomeCategory::Plains => "PLAINS",
            BiomeCategory::Forest => "FOREST",
            BiomeCategory::Sandy => "SANDY",
            BiomeCategory::Cold => "COLD",
            BiomeCategory::Hot => "HOT",
            BiomeCategory::Wet => "WET",
            BiomeCategory::Mountain => "MOUNTAIN",
            BiomeCategory::Water => "WATER",
        }
    }
}
