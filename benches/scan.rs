use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use matchmill::scanner::{FileScanner, ScanOptions};
use tempfile::{TempDir, tempdir};

const FILE_COUNT: usize = 100;
const WORKER_COUNTS: [usize; 4] = [1, 2, 4, 8];

fn setup_corpus() -> TempDir {
    let dir = tempdir().expect("tempdir");
    for i in 0..FILE_COUNT {
        let mut contents = String::new();
        for line in 0..40 {
            if (i + line) % 3 == 0 {
                contents.push_str(&format!("alpha beta needle-{line} gamma\n"));
            } else {
                contents.push_str("alpha beta gamma delta\n");
            }
        }
        std::fs::write(dir.path().join(format!("doc-{i:03}.txt")), contents).expect("seed file");
    }
    dir
}

fn bench_scan(c: &mut Criterion) {
    let corpus = setup_corpus();
    for workers in WORKER_COUNTS {
        c.bench_with_input(
            BenchmarkId::new("scan_workers", workers),
            &workers,
            |b, &workers| {
                b.iter(|| {
                    let mut scanner = FileScanner::new();
                    let options =
                        ScanOptions::new("*.txt", "needle-[0-9]+").with_workers(workers);
                    let stats = scanner
                        .scan(black_box(corpus.path()), &options)
                        .expect("scan");
                    assert_eq!(stats.scanned, FILE_COUNT);
                });
            },
        );
    }
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
