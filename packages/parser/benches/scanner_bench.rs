use criterion::{black_box, criterion_group, criterion_main, Criterion};
use devup_ui_parser::scan;

const PACKAGE: &str = "@devup-ui/react";

fn scan_small_component(c: &mut Criterion) {
    let source = r#"
        import { Box, css } from "@devup-ui/react";

        export function Button({ active }) {
            return (
                <Box
                    as="button"
                    bg={active ? "$primary" : "$gray"}
                    px={4}
                    className={css({ cursor: "pointer" })}
                    _hover={{ opacity: 0.8 }}
                >
                    Click me
                </Box>
            );
        }
    "#;

    c.bench_function("scan_small_component", |b| {
        b.iter(|| scan(black_box(source), PACKAGE))
    });
}

fn scan_large_module(c: &mut Criterion) {
    let mut source = String::from(
        "import { Box, Flex, Text, css, keyframes } from \"@devup-ui/react\";\n",
    );
    for i in 0..200 {
        source.push_str(&format!(
            "export const C{i} = () => <Flex gap={{{i}}} p={{[1, null, {i}]}}><Text color=\"$text\" fontSize={{{i}}}>{i}</Text><Box w=\"100%\" /></Flex>;\n"
        ));
        source.push_str(&format!(
            "const s{i} = css({{ margin: {i}, _hover: {{ color: \"red\" }} }});\n"
        ));
    }
    source.push_str("const spin = keyframes({ from: { transform: \"rotate(0)\" }, to: { transform: \"rotate(360deg)\" } });\n");

    c.bench_function("scan_large_module", |b| {
        b.iter(|| scan(black_box(&source), PACKAGE))
    });
}

fn scan_without_package_import(c: &mut Criterion) {
    let source = "import React from \"react\";\n".to_string()
        + &"export const A = () => <div className=\"a\">{value < limit ? 1 : 2}</div>;\n".repeat(500);

    c.bench_function("scan_without_package_import", |b| {
        b.iter(|| scan(black_box(&source), PACKAGE))
    });
}

criterion_group!(
    benches,
    scan_small_component,
    scan_large_module,
    scan_without_package_import
);
criterion_main!(benches);
