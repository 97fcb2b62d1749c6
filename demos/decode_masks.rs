//! Mask decoding example: CSV table to per-image targets.
//!
//! Pass a mask CSV path to run on real data, otherwise a small inline table
//! is used.

use vessel_detect::loader::{load_masks_from_file, load_masks_from_str};
use vessel_detect::rle::rle_to_bbox;
use vessel_detect::targets::{filter_masks, train_valid_split, TestSize};
use vessel_detect::transform::Resize;
use vessel_detect::types::{MODEL_FRAME, ORIGINAL_FRAME};

const SAMPLE_CSV: &str = "ImageId,EncodedPixels
00003e153.jpg,
000155de5.jpg,264661 17 265429 33 266197 33 266965 33 267733 33
000194a2d.jpg,360486 1 361252 4 362019 5 362785 8 363552 10
000194a2d.jpg,51834 9 52602 9 53370 9 54138 9 54906 9
0001b1832.jpg,5 3
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let records = match std::env::args().nth(1) {
        Some(path) => load_masks_from_file(path)?,
        None => load_masks_from_str(SAMPLE_CSV)?,
    };
    println!("=== Mask Decoding Example ===\n");
    println!("Loaded {} mask rows", records.len());

    println!("\n1. Decoding single masks");
    for record in records.iter().take(5) {
        match record.encoded_pixels.as_deref() {
            Some(rle) => match rle_to_bbox(rle, ORIGINAL_FRAME) {
                Ok(bbox) => println!("   {} -> {:?}", record.image_id, bbox.to_xyxy()),
                Err(e) => println!("   {} -> {}", record.image_id, e),
            },
            None => println!("   {} -> no vessel", record.image_id),
        }
    }

    println!("\n2. Filtering images");
    let filtered = filter_masks(&records, false);
    println!("   {}", filtered.stats.summary_string());

    println!("\n3. Targets in the model frame");
    let resize = Resize::new(ORIGINAL_FRAME, MODEL_FRAME);
    for idx in filtered.ids() {
        let target = filtered.target(idx, ORIGINAL_FRAME)?;
        let resized = resize.resize_boxes(&target.boxes);
        println!(
            "   [{}] {}: {} boxes, all valid after resize: {}",
            idx,
            filtered.image_names[&idx],
            resized.len(),
            resized.iter().all(|b| b.is_valid_in(MODEL_FRAME))
        );
    }

    if filtered.len() >= 2 {
        println!("\n4. Train/valid split");
        let (train, valid) = train_valid_split(&filtered.ids(), TestSize::Count(1), 0)?;
        println!("   train: {:?}", train);
        println!("   valid: {:?}", valid);
    }

    Ok(())
}
