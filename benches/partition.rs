use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mien::{
    AttributeCatalog, ClusterPartitioner, Dbscan, HierarchicalClustering, Kmeans,
    PartitionEvaluator, SampleTable,
};
use rand::prelude::*;
use std::sync::Arc;

fn synthetic_table(n: usize) -> Arc<SampleTable> {
    let catalog = AttributeCatalog::celeba();
    let mut rng = StdRng::seed_from_u64(42);
    let mut table = SampleTable::new(Arc::new(catalog));
    for i in 0..n {
        let v = (0..40).map(|_| u8::from(rng.random::<f32>() < 0.3)).collect();
        table.push(format!("{:06}.jpg", i + 1), v, None).unwrap();
    }
    Arc::new(table)
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    let table = synthetic_table(500);

    group.bench_function("kmeans_n500_d40_k8", |b| {
        b.iter(|| {
            let mut p = ClusterPartitioner::new(Kmeans::new(8).with_n_init(1).with_seed(51));
            let _ = p.fit(black_box(&table), None).unwrap();
        })
    });

    group.bench_function("dbscan_n500_d40", |b| {
        b.iter(|| {
            let mut p = ClusterPartitioner::new(Dbscan::new(1.5, 5));
            let _ = p.fit(black_box(&table), None).unwrap();
        })
    });

    group.bench_function("ward_n500_d40_k8", |b| {
        b.iter(|| {
            let mut p = ClusterPartitioner::new(HierarchicalClustering::new(8));
            let _ = p.fit(black_box(&table), None).unwrap();
        })
    });

    let mut fitted = ClusterPartitioner::new(Kmeans::new(8).with_seed(51));
    let _ = fitted.fit(&table, None).unwrap();
    group.bench_function("silhouette_n500_d40", |b| {
        b.iter(|| PartitionEvaluator::new().evaluate(black_box(&fitted)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_partition);
criterion_main!(benches);
