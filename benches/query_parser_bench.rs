use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use predicate_logic::config::OperatorList;
use predicate_logic::lexer::Tokenizer;
use predicate_logic::parser::Parser;
use predicate_logic::QueryParser;
use std::hint::black_box;

const TEST_CASES: [(&str, &str); 3] = [
    ("simple", "active"),
    ("medium", r#"age >= 18 and name.StartsWith("J") or vip"#),
    (
        "complex",
        r#"(age > 18 and not (city.Contains("burg") or country != "DE")) or (score == (1==2 ? 3 : 5) and id in (1,2,3))"#,
    ),
];

// 基准测试：词法分析性能
fn benchmark_tokenizer(c: &mut Criterion) {
    let operators = OperatorList::default();
    let tokenizer = Tokenizer::new(&operators).expect("默认运算符应该有效");

    let mut group = c.benchmark_group("tokenizer_performance");

    for (name, query) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &query, |b, &query| {
            b.iter(|| black_box(tokenizer.tokenize(black_box(query))))
        });
    }

    group.finish();
}

// 基准测试：语法分析性能
fn benchmark_parser(c: &mut Criterion) {
    let operators = OperatorList::default();
    let tokenizer = Tokenizer::new(&operators).expect("默认运算符应该有效");

    let mut group = c.benchmark_group("parser_performance");

    for (name, query) in TEST_CASES {
        // 预先词法分析
        let tokens = tokenizer.tokenize(query);

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| black_box(Parser::new(query, black_box(tokens), &operators).parse()))
        });
    }

    group.finish();
}

// 基准测试：长 or 链, 覆盖右倾树的构建
fn benchmark_long_chain(c: &mut Criterion) {
    let parser = QueryParser::with_operators(OperatorList::default()).expect("默认运算符应该有效");

    let mut group = c.benchmark_group("long_chain");

    for length in [10usize, 100, 1000] {
        let query = (0..length)
            .map(|i| format!("field{i} == {i}"))
            .collect::<Vec<_>>()
            .join(" or ");
        group.bench_with_input(BenchmarkId::new("parse", length), &query, |b, query| {
            b.iter(|| black_box(parser.parse(black_box(query))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tokenizer,
    benchmark_parser,
    benchmark_long_chain
);
criterion_main!(benches);
