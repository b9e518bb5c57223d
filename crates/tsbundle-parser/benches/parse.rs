//! Lexer and statement parser benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tsbundle_parser::{Lexer, Parser, ParserOptions, TokenKind};

const SAMPLE_SOURCE: &str = r#"
import { readFile } from "./fs";
import type { Options } from "./options";

declare const VERSION: string;

export interface Shape {
    area(): number;
}

export enum Color { Red, Green = "green", Blue = 4 }

function fibonacci(n: number): number {
    if (n <= 1) return n;
    return fibonacci(n - 1) + fibonacci(n - 2);
}

export class Calculator {
    result = 0;

    add(x: number, y: number) {
        return x + y;
    }

    async load(path: string) {
        const text = await readFile(path);
        return JSON.parse(text);
    }
}

const calc = new Calculator();
const numbers = [1, 2, 3, 4, 5].map(n => n * 2);
const { a, b, ...rest } = { a: 1, b: 2, c: 3, d: 4 };
const template = `Hello ${name}, you have ${count} messages`;

export { fibonacci };
export default calc;
"#;

fn options() -> ParserOptions {
    ParserOptions {
        is_bundling: true,
        typescript: true,
    }
}

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(SAMPLE_SOURCE));
            loop {
                let token = lexer.next_token();
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
        });
    });

    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| Parser::new(black_box(SAMPLE_SOURCE), options()).parse());
    });

    group.finish();
}

criterion_group!(benches, bench_lexer, bench_parser);
criterion_main!(benches);
