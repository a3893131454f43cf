use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use gridformat::{ByteOrder, Codec, Compressor, Encoder, FieldData, HeaderPrecision};

fn compress_bench(c: &mut Criterion) {
    // smooth data with some noise, roughly what a simulation produces
    let noise: Array1<f64> = Array1::random(1 << 18, Uniform::new(0., 1e-3));
    let values: Vec<f64> = noise
        .iter()
        .enumerate()
        .map(|(i, n)| (i as f64 * 1e-3).sin() + n)
        .collect();
    let data = FieldData::Float64(values);

    for (name, compressor) in [
        ("zlib", Compressor::zlib()),
        ("lz4", Compressor::lz4()),
        ("lzma", Compressor::lzma()),
    ] {
        let codec = Codec::new(Encoder::RawBinary, compressor, HeaderPrecision::UInt64, ByteOrder::LittleEndian);
        c.bench_function(&format!("compress 2MB {}", name), |b| {
            b.iter(|| codec.encode(black_box(&data)).unwrap())
        });
    }
}

criterion_group!(benches, compress_bench);
criterion_main!(benches);
