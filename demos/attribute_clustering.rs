use image::{Rgb, RgbImage};
use mien::inference::from_fn;
use mien::{
    labels_to_indices, ClusterPartitioner, Config, InMemoryImages, Kmeans, SampleTable, Weights,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_toml_str(
        r#"
        [attributes]
        subset = ["Smiling", "Eyeglasses", "Blond_Hair", "Male"]

        [inference]
        batch_size = 8
        input_size = 16

        [summary]
        tile_size = 32
        layout = "all_stats"
        components = 3
        "#,
    )?;

    // Synthetic "faces": the red channel encodes blond hair, green a smile,
    // blue eyeglasses. Every fourth image carries nothing at all.
    let mut images = InMemoryImages::new();
    let mut references = Vec::new();
    for i in 0..40u32 {
        let reference = format!("{:06}.jpg", i + 1);
        let (r, g, b) = match i % 4 {
            0 => (220, 40, 30),
            1 => (30, 220, 40),
            2 => (40, 30, 220),
            _ => (10, 10, 10),
        };
        let jitter = (i * 3 % 17) as u8;
        images.insert(
            reference.clone(),
            RgbImage::from_fn(48, 48, |x, y| {
                let shade = ((x + y) % 8) as u8;
                Rgb([r + jitter + shade, g + shade, b + jitter])
            }),
        );
        references.push(reference);
    }

    // Stand-in for a pretrained classifier over all forty CelebA attributes.
    let model = from_fn(|batch: &[RgbImage]| {
        Ok(batch
            .iter()
            .map(|img| {
                let Rgb([r, g, b]) = *img.get_pixel(img.width() / 2, img.height() / 2);
                let mut probs = vec![0.1_f32; 40];
                probs[9] = f32::from(r) / 255.0; // Blond_Hair
                probs[31] = f32::from(g) / 255.0; // Smiling
                probs[15] = f32::from(b) / 255.0; // Eyeglasses
                probs
            })
            .collect())
    });

    let subset: Vec<&str> = config.attributes.subset.iter().map(String::as_str).collect();
    let table = SampleTable::from_inference(
        &references,
        &images,
        &model,
        &mien::AttributeCatalog::celeba(),
        &subset,
        &config.inference_options(),
    )?;
    let table = Arc::new(table.thin_all_zero(0.5, config.sampling.seed)?);
    println!("{} samples over {:?}", table.len(), table.schema().names());

    // Smiles matter twice as much as anything else.
    let weights = Weights::PerAttribute(vec![2.0, 1.0, 1.0, 1.0]);
    let mut partitioner = ClusterPartitioner::new(Kmeans::new(4).with_seed(config.sampling.seed));
    let partition = partitioner.fit(&table, Some(&weights))?;
    for (label, members) in labels_to_indices(partition.labels()) {
        println!("cluster {label}: {members:?}");
    }

    let report = config
        .renderer()
        .report(&partitioner, &config.evaluator(), &images, config.summary.layout)?;
    match report.score {
        Some(score) => println!("silhouette: {score:.3}"),
        None => println!("silhouette: n/a"),
    }
    for panel in &report.panels {
        let top: Vec<String> = panel
            .frequencies
            .iter()
            .flatten()
            .filter(|(_, f)| *f >= 0.5)
            .map(|(name, f)| format!("{name}={f:.2}"))
            .collect();
        println!(
            "k={} size={} mosaic={:?} top=[{}]",
            panel.k,
            panel.size,
            panel.mosaic.dimensions(),
            top.join(", ")
        );
    }

    if let Some(panel) = report.panels.first() {
        let out = std::env::temp_dir().join("mien_cluster_0_mosaic.png");
        panel.mosaic.save(&out)?;
        if let Some(face) = &panel.mean_face {
            face.save(std::env::temp_dir().join("mien_cluster_0_mean_face.png"))?;
        }
        println!("wrote {}", out.display());
    }

    Ok(())
}
