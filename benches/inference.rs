use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rowkit::{DetectionConfig, TableOptions, Value, create_table, detect_types};

fn generate_orders(rows: usize) -> Vec<Vec<String>> {
    let mut data = Vec::with_capacity(rows + 1);
    data.push(
        ["Order Id", "Ordered At", "Amount", "Discount", "Status", "Shipped"]
            .iter()
            .map(|name| name.to_string())
            .collect(),
    );
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        let day = (i % 28) + 1;
        let hour = i % 24;
        data.push(vec![
            (i + 1).to_string(),
            format!("2024-01-{day:02} {hour:02}:00:00"),
            format!("{}.{:02}", i * 7 % 1000, i % 100),
            format!("{}%", i % 50),
            status.to_string(),
            if i % 2 == 0 { "yes" } else { "no" }.to_string(),
        ]);
    }
    data
}

fn bench_detection(c: &mut Criterion) {
    let data = generate_orders(5_000);
    let names: Vec<String> = data[0].clone();
    let sample: Vec<Vec<Option<Value>>> = data[1..]
        .iter()
        .map(|row| row.iter().map(|cell| Some(Value::from(cell))).collect())
        .collect();
    let config = DetectionConfig::default();

    c.bench_function("detect_types_5k", |b| {
        b.iter(|| detect_types(&names, &sample, &config).expect("detect"))
    });
}

fn bench_create_table(c: &mut Criterion) {
    let data = generate_orders(5_000);
    let mut group = c.benchmark_group("create_table");
    group.bench_function("full_sample", |b| {
        b.iter_batched(
            || data.clone(),
            |rows| create_table(rows, &TableOptions::new()).expect("create table"),
            BatchSize::LargeInput,
        )
    });
    group.bench_function("sample_100", |b| {
        b.iter_batched(
            || data.clone(),
            |rows| create_table(rows, &TableOptions::new().samples(100)).expect("create table"),
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_detection, bench_create_table);
criterion_main!(benches);
