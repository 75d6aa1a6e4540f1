//! Benchmarks for the patch pipeline.
//!
//! Measures the hot phases of a run in isolation and end to end:
//! - Method body decoding and encoding
//! - Symbol table construction over large synthetic modules
//! - Overload resolution
//! - Hook registry construction
//! - Full in-memory apply
//! - Image serialization and deserialization

extern crate dotsplice;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use dotsplice::cil::{decode_body, encode_body};
use dotsplice::diagnostics::Diagnostics;
use dotsplice::metadata::attributes::{AttrArgument, CustomAttribute};
use dotsplice::metadata::{MethodBuilder, Module, ModuleBuilder, SymbolTable, TypeBuilder};
use dotsplice::patch::{registry, resolver};
use dotsplice::{PatchOptions, Patcher};
use std::hint::black_box;

/// A module with `types` public types, each declaring `methods` static
/// single-parameter methods with a two-instruction body.
fn synthetic_target(types: usize, methods: usize) -> Module {
    let mut builder = ModuleBuilder::new("game.dspl");
    for t in 0..types {
        let mut type_builder = TypeBuilder::new("Game", format!("Type{t}")).public();
        for m in 0..methods {
            type_builder = type_builder.method(
                MethodBuilder::new(format!("Method{m}"))
                    .public()
                    .static_method()
                    .param("value", "System.Int32")
                    .body(vec![0x00, 0x2A]), // nop; ret
            );
        }
        builder = builder.type_def(type_builder);
    }
    builder.build().unwrap()
}

/// A hook module with `count` start-placement hook declarations, each
/// targeting `Game.Type{i}.Method0`.
fn synthetic_hooks(count: usize) -> Module {
    let mut hooks_type = TypeBuilder::new("Mods", "Hooks").public();
    for i in 0..count {
        hooks_type = hooks_type.method(
            MethodBuilder::new(format!("OnMethod{i}"))
                .public()
                .static_method()
                .attribute(CustomAttribute::new(
                    registry::CALL_HOOK_ATTRIBUTE,
                    vec![AttrArgument::Str(format!("Game.Type{i}.Method0"))],
                )),
        );
    }
    ModuleBuilder::new("hooks.dspl")
        .type_def(hooks_type)
        .build()
        .unwrap()
}

/// A straight-line body of `blocks` push/pop pairs followed by a return.
fn straight_body(blocks: usize) -> Vec<u8> {
    let mut body = Vec::with_capacity(blocks * 3 + 1);
    for _ in 0..blocks {
        body.extend_from_slice(&[0x1F, 0x01, 0x26]); // ldc.i4.s 1; pop
    }
    body.push(0x2A); // ret
    body
}

/// Benchmark decoding a minimal two-instruction body.
fn bench_decode_tiny_body(c: &mut Criterion) {
    let body = [0x00, 0x2A];

    c.bench_function("cil_decode_tiny_body", |b| {
        b.iter(|| {
            let instructions = decode_body(black_box(&body)).unwrap();
            black_box(instructions)
        });
    });
}

/// Benchmark decoding a 301-instruction straight-line body.
fn bench_decode_long_body(c: &mut Criterion) {
    let body = straight_body(100);

    c.bench_function("cil_decode_long_body", |b| {
        b.iter(|| {
            let instructions = decode_body(black_box(&body)).unwrap();
            black_box(instructions)
        });
    });
}

/// Benchmark decoding a body with a forward branch, which exercises the
/// offset-to-index target resolution pass.
fn bench_decode_branchy_body(c: &mut Criterion) {
    // ldc.i4.s 1; brfalse.s -> ret; ldc.i4.s 2; ret
    let body = [0x1F, 0x01, 0x2C, 0x02, 0x1F, 0x02, 0x2A];

    c.bench_function("cil_decode_branchy_body", |b| {
        b.iter(|| {
            let instructions = decode_body(black_box(&body)).unwrap();
            black_box(instructions)
        });
    });
}

/// Benchmark encoding a long decoded body back to bytes.
fn bench_encode_long_body(c: &mut Criterion) {
    let instructions = decode_body(&straight_body(100)).unwrap();

    c.bench_function("cil_encode_long_body", |b| {
        b.iter(|| {
            let bytes = encode_body(black_box(&instructions)).unwrap();
            black_box(bytes)
        });
    });
}

/// Benchmark building the symbol table over 256 types.
fn bench_symbol_table_construction(c: &mut Criterion) {
    let module = synthetic_target(256, 4);

    c.bench_function("symbols_build_256_types", |b| {
        b.iter(|| {
            let symbols = SymbolTable::new(black_box(&module));
            black_box(symbols)
        });
    });
}

/// Benchmark resolving a hook against a method name with eight overloads.
fn bench_resolve_among_overloads(c: &mut Criterion) {
    let param_types = [
        "System.Int32",
        "System.Single",
        "System.Int64",
        "System.Double",
        "System.Boolean",
        "System.String",
        "System.Byte",
        "System.Int16",
    ];
    let mut player = TypeBuilder::new("Game", "Player").public();
    for type_name in param_types {
        player = player.method(
            MethodBuilder::new("Update")
                .public()
                .static_method()
                .param("value", type_name)
                .body(vec![0x2A]),
        );
    }
    let target = ModuleBuilder::new("game.dspl")
        .type_def(player)
        .build()
        .unwrap();
    let symbols = SymbolTable::new(&target);

    let hooks = ModuleBuilder::new("hooks.dspl")
        .type_def(
            TypeBuilder::new("Mods", "Hooks").public().method(
                MethodBuilder::new("OnUpdate")
                    .public()
                    .static_method()
                    .param("value", "System.Int64"),
            ),
        )
        .build()
        .unwrap();
    let hook = &hooks.types()[0].methods[0];

    c.bench_function("resolve_eight_overloads", |b| {
        b.iter(|| {
            let resolution =
                resolver::resolve(black_box(&target), &symbols, "Game.Player", "Update", hook);
            black_box(resolution)
        });
    });
}

/// Benchmark scanning and screening fifty hook declarations.
fn bench_registry_build(c: &mut Criterion) {
    let hooks = synthetic_hooks(50);

    c.bench_function("registry_build_fifty_hooks", |b| {
        b.iter(|| {
            let diagnostics = Diagnostics::new();
            let set = registry::build(black_box(&hooks), &diagnostics).unwrap();
            black_box(set)
        });
    });
}

/// Benchmark a full in-memory apply: twenty hooks spliced into a module of
/// 64 types.
fn bench_apply_twenty_hooks(c: &mut Criterion) {
    let hooks = synthetic_hooks(20);
    let target = synthetic_target(64, 4);

    c.bench_function("apply_twenty_hooks", |b| {
        b.iter_batched(
            || target.clone(),
            |mut target| {
                let patcher = Patcher::new(PatchOptions::default());
                let summary = patcher.apply(black_box(&hooks), &mut target).unwrap();
                black_box(summary)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark serializing a 64-type module to image bytes.
fn bench_image_write(c: &mut Criterion) {
    let module = synthetic_target(64, 4);

    c.bench_function("image_write_64_types", |b| {
        b.iter(|| {
            let bytes = module.to_vec().unwrap();
            black_box(bytes)
        });
    });
}

/// Benchmark loading a 64-type module from image bytes.
fn bench_image_read(c: &mut Criterion) {
    let bytes = synthetic_target(64, 4).to_vec().unwrap();

    c.bench_function("image_read_64_types", |b| {
        b.iter_batched(
            || bytes.clone(),
            |bytes| {
                let module = Module::from_mem(bytes).unwrap();
                black_box(module)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    // Method bodies
    bench_decode_tiny_body,
    bench_decode_long_body,
    bench_decode_branchy_body,
    bench_encode_long_body,
    // Resolution
    bench_symbol_table_construction,
    bench_resolve_among_overloads,
    // Pipeline
    bench_registry_build,
    bench_apply_twenty_hooks,
    // Image format
    bench_image_write,
    bench_image_read,
);
criterion_main!(benches);
