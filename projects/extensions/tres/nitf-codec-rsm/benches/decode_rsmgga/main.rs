use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use nitf_codec_rsm::rsmgga;
use nitf_codec_schema::{DecodedRecord, Value};
use std::hint::black_box;

/// Builds a grid of `planes` planes with `side * side` points each.
fn grid(planes: usize, side: usize) -> DecodedRecord {
    let mut record = DecodedRecord::new();
    record.set("edition", &[], Some(Value::from("BENCH")));
    record.set("ggrsn", &[], Some(Value::Int(1)));
    record.set("ggcsn", &[], Some(Value::Int(1)));
    record.set("npln", &[], Some(Value::Int(planes as i64)));
    for name in ["deltaz", "deltax", "deltay", "zpln1", "xipln1", "yipln1"] {
        record.set(name, &[], Some(Value::Float(1.0)));
    }
    record.set("refrow", &[], Some(Value::Int(5000)));
    record.set("refcol", &[], Some(Value::Int(5000)));
    record.set("tnumrd", &[], Some(Value::Int(8)));
    record.set("tnumcd", &[], Some(Value::Int(8)));
    record.set("fnumrd", &[], Some(Value::Int(3)));
    record.set("fnumcd", &[], Some(Value::Int(3)));
    for plane in 0..planes.saturating_sub(1) {
        record.set("ixo", &[plane], Some(Value::Int(0)));
        record.set("iyo", &[plane], Some(Value::Int(0)));
    }
    for plane in 0..planes {
        record.set("nxpts", &[plane], Some(Value::Int(side as i64)));
        record.set("nypts", &[plane], Some(Value::Int(side as i64)));
        for point in 0..side * side {
            let offset = (point % 1000) as f64 * 0.125;
            record.set("rcoord", &[plane, point], Some(Value::Float(5000.0 + offset)));
            record.set("ccoord", &[plane, point], Some(Value::Float(5000.0 - offset)));
        }
    }
    record
}

fn criterion_benchmark(c: &mut Criterion) {
    let schema = rsmgga::schema().unwrap();
    let mut group = c.benchmark_group("RSMGGA Decode/Encode");

    for (planes, side) in [(2, 8), (4, 32)] {
        let record = grid(planes, side);
        let encoded = schema.codec().encode_to_vec(&record).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_function(format!("decode_{planes}x{side}x{side}"), |b| {
            b.iter(|| schema.codec().decode_slice(black_box(&encoded)).unwrap())
        });
        group.bench_function(format!("encode_{planes}x{side}x{side}"), |b| {
            b.iter(|| schema.codec().encode_to_vec(black_box(&record)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
