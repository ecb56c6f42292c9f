use criterion::{black_box, criterion_group, criterion_main, Criterion};
use breeze::new_interpreter_with_io;

const FIBONACCI: &str = r#"
func fibonacci(x) {
    if (x lt 2) {
        return x;
    }
    return fibonacci(x - 1) + fibonacci(x - 2);
}

fibonacci(20);
"#;

const COUNTING_LOOP: &str = r#"
word = "breeze";
for (i = 0; i lt 10000; i = i + 1) {
    if (word[i - i / 6 * 6] eq "z") {
        continue;
    }
    print(word[0:i - i / 6 * 6]);
}
"#;

fn interpreter_benchmark(c: &mut Criterion) {
    c.bench_function("fibonacci", |b| {
        b.iter(|| {
            let mut engine = new_interpreter_with_io(&b""[..], std::io::sink());
            engine.run(black_box(FIBONACCI)).unwrap();
        })
    });

    c.bench_function("counting loop", |b| {
        b.iter(|| {
            let mut engine = new_interpreter_with_io(&b""[..], std::io::sink());
            engine.run(black_box(COUNTING_LOOP)).unwrap();
        })
    });
}

criterion_group!(benches, interpreter_benchmark);
criterion_main!(benches);
