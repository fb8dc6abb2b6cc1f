use rand::prelude::*;
use skymoc_core::{first_index, pixel_count, PixelIndex, BASE_PIXELS, MAX_ORDER};

/// A random pixel set, in random order, whose pixels are no finer than `max_order`.
///
/// Starting from the 12 base pixels, every pixel coarser than `max_order` is split into its children with probability
/// `split_probability`; every pixel that is not split is kept with probability `keep_probability`. The same `seed` always
/// gives the same set.
pub fn random_pixel_set(
    seed: u64,
    max_order: u8,
    split_probability: f64,
    keep_probability: f64,
) -> Vec<u64> {
    let max_order = max_order.min(MAX_ORDER);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut pixels = Vec::new();
    let mut stack: Vec<PixelIndex> = (first_index(0)..first_index(0) + BASE_PIXELS)
        .map(PixelIndex)
        .collect();
    while let Some(pixel) = stack.pop() {
        if pixel.order() < max_order && rng.gen_bool(split_probability) {
            if let Some(children) = pixel.children() {
                stack.extend_from_slice(&children);
            }
        } else if rng.gen_bool(keep_probability) {
            pixels.push(pixel.0);
        }
    }
    pixels.shuffle(&mut rng);

    pixels
}

/// A random partial sky map: a `random_pixel_set` with a value in `[0, 1)` for each pixel.
pub fn random_sky_map(seed: u64, max_order: u8) -> (Vec<u64>, Vec<f64>) {
    let u = random_pixel_set(seed, max_order, 0.6, 0.8);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let x = u.iter().map(|_| rng.gen::<f64>()).collect();

    (u, x)
}

/// Every pixel at `order`, sorted.
pub fn full_sky(order: u8) -> Vec<u64> {
    let first = first_index(order);

    (first..first + pixel_count(order)).collect()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
