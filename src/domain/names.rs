//! Guest display-name generation (spec.md §4.10.3).

use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Rusty", "Golden", "Dusty", "Lucky", "Sturdy", "Gritty", "Shiny", "Hollow", "Ironclad",
    "Stubborn", "Weathered", "Nimble",
];

const NOUNS: &[&str] = &[
    "Digger", "Prospector", "Pickaxe", "Burrower", "Miner", "Tunneler", "Excavator", "Spelunker",
    "Driller", "Sapper", "Quarryman", "Shoveler",
];

/// Picks a random "Adjective Noun" pair plus a short numeric suffix to
/// keep collisions rare without a coordination round-trip.
pub fn random_guest_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let suffix: u16 = rng.gen_range(0..1000);
    format!("{adjective}{noun}{suffix:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_nonempty_name() {
        let name = random_guest_name();
        assert!(!name.is_empty());
        assert!(name.len() <= 32);
    }
}
