use rand::{seq::SliceRandom, Rng};

use super::Good;

const KINDS: [&str; 4] = ["Kettle", "Stove", "Coffee machine", "Fridge"];
const BRANDS: [&str; 3] = ["Bork", "Bosch", "LG"];

/// Generates a goods manifest of 1 to 4 random items, priced between 1000 and 50000.
///
/// The accrual service requires a non-empty manifest with every registration. Its content carries no meaning for
/// this system.
pub fn random_goods() -> Vec<Good> {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(1..=4);
    (0..count)
        .map(|_| {
            let kind = KINDS.choose(&mut rng).copied().unwrap_or("Kettle");
            let brand = BRANDS.choose(&mut rng).copied().unwrap_or("Bork");
            let price: u32 = rng.gen_range(1_000..=50_000);
            Good { description: format!("{kind} {brand}"), price: f64::from(price) }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn manifest_is_never_empty() {
        for _ in 0..100 {
            let goods = random_goods();
            assert!((1..=4).contains(&goods.len()));
            for good in goods {
                assert!((1_000.0..=50_000.0).contains(&good.price));
                assert!(!good.description.is_empty());
            }
        }
    }
}
