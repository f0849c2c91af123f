//! Random profile ids, display names and icons.
//!
//! All generators take the random source as a parameter so callers (and tests)
//! decide how it is seeded.

use rand::seq::SliceRandom;
use rand::Rng;

/// Length of a generated profile id.
pub const PROFILE_ID_LEN: usize = 32;

const ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Rock names used for generated profile names, e.g. `Adakite 58`.
const ROCK_NAMES: &[&str] = &[
    "A'a", "Adakite", "Alkali Feldspar Granite", "Amphibolite", "Andesite", "Anorthosite",
    "Anthracite", "Aplite", "Argillite", "Arkose", "Banded Iron Formation", "Basalt",
    "Basanite", "Benmoreite", "Blueschist", "Boninite", "Breccia", "Calcarenite",
    "Carbonatite", "Chalk", "Charnockite", "Chert", "Claystone", "Coal", "Conglomerate",
    "Coquina", "Dacite", "Diabase", "Diatomite", "Diorite", "Dolomite", "Dunite", "Eclogite",
    "Essexite", "Evaporite", "Flint", "Gabbro", "Geyserite", "Gneiss", "Granite",
    "Granodiorite", "Granulite", "Greenschist", "Greywacke", "Gritstone", "Harzburgite",
    "Hornfels", "Ignimbrite", "Ijolite", "Kimberlite", "Komatiite", "Lamproite", "Laterite",
    "Latite", "Lherzolite", "Lignite", "Limestone", "Marble", "Marl", "Migmatite",
    "Monzonite", "Mudstone", "Mylonite", "Nepheline Syenite", "Norite", "Obsidian",
    "Oil Shale", "Oolite", "Pahoehoe", "Pegmatite", "Peridotite", "Phonolite", "Phyllite",
    "Picrite", "Porphyry", "Pumice", "Pyroxenite", "Quartz Diorite", "Quartzite", "Rhyolite",
    "Sandstone", "Schist", "Scoria", "Serpentinite", "Shale", "Siltstone", "Skarn", "Slate",
    "Soapstone", "Suevite", "Syenite", "Tachylyte", "Tephrite", "Tillite", "Tonalite",
    "Trachyte", "Travertine", "Troctolite", "Tufa", "Tuff", "Turbidite", "Websterite",
    "Wehrlite", "Whiteschist",
];

/// Block icons built into the vanilla launcher.
const LAUNCHER_ICONS: &[&str] = &[
    "Bedrock", "Bookshelf", "Brick", "Cake", "Carved_Pumpkin", "Chest", "Clay", "Coal_Block",
    "Coal_Ore", "Cobblestone", "Crafting_Table", "Creeper_Head", "Diamond_Block", "Diamond_Ore",
    "Dirt", "Dirt_Podzol", "Dirt_Snow", "Emerald_Block", "Emerald_Ore", "Enchanting_Table",
    "End_Stone", "Farmland", "Furnace", "Furnace_On", "Glass", "Glazed_Terracotta_Light_Blue",
    "Glazed_Terracotta_Orange", "Glazed_Terracotta_White", "Glowstone", "Gold_Block",
    "Gold_Ore", "Grass", "Gravel", "Hardened_Clay", "Ice_Packed", "Iron_Block", "Iron_Ore",
    "Lapis_Ore", "Leaves_Birch", "Leaves_Jungle", "Leaves_Oak", "Leaves_Spruce",
    "Lectern_Book", "Log_Acacia", "Log_Birch", "Log_DarkOak", "Log_Jungle", "Log_Oak",
    "Log_Spruce", "Mycelium", "Nether_Brick", "Netherrack", "Obsidian", "Planks_Acacia",
    "Planks_Birch", "Planks_DarkOak", "Planks_Jungle", "Planks_Oak", "Planks_Spruce",
    "Quartz_Ore", "Red_Sand", "Red_Sandstone", "Redstone_Block", "Redstone_Ore", "Sand",
    "Sandstone", "Skeleton_Skull", "Snow", "Soul_Sand", "Stone", "Stone_Andesite",
    "Stone_Diorite", "Stone_Granite", "TNT", "Water", "Wool",
];

/// 32 lowercase alphanumeric characters, the same shape the launcher uses.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PROFILE_ID_LEN)
        .map(|_| ID_CHARS[rng.gen_range(0..ID_CHARS.len())] as char)
        .collect()
}

/// `<rock> <0-99>`
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let rock = ROCK_NAMES.choose(rng).copied().unwrap_or("Rock");
    format!("{} {}", rock, rng.gen_range(0..100))
}

pub fn random_icon<R: Rng + ?Sized>(rng: &mut R) -> String {
    LAUNCHER_ICONS.choose(rng).copied().unwrap_or("Furnace").to_string()
}

pub fn default_icons() -> &'static [&'static str] {
    LAUNCHER_ICONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let id = random_id(&mut rng);
            assert_eq!(id.len(), PROFILE_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_random_name_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let name = random_name(&mut rng);
            let (rock, number) = name.rsplit_once(' ').unwrap();
            assert!(ROCK_NAMES.contains(&rock));
            assert!(number.parse::<u32>().unwrap() < 100);
        }
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(random_id(&mut a), random_id(&mut b));
        assert_eq!(random_name(&mut a), random_name(&mut b));
        assert_eq!(random_icon(&mut a), random_icon(&mut b));
    }

    #[test]
    fn test_random_icon_is_builtin() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let icon = random_icon(&mut rng);
            assert!(default_icons().contains(&icon.as_str()));
        }
    }
}
