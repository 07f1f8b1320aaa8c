#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;
use weft::prelude::*;

#[derive(Arbitrary, Debug)]
enum Piece {
    Text(String),
    Interpolation(u8),
    Element { directive: u8, expr: u8, children: Vec<Piece> },
}

const EXPRS: &[&str] = &["a", "b.c", "b", "missing", "a.x", " b . c ", ""];
const DIRECTIVES: &[&str] = &[
    "bind-text",
    "bind-markup",
    "bind-value",
    "bind-attr:title",
    "bind-on:click",
    "@input",
    "bind-nope",
    "class",
];

fn pick<'a>(table: &[&'a str], index: u8) -> &'a str {
    table[usize::from(index) % table.len()]
}

fn render(piece: &Piece, out: &mut String, depth: usize) {
    match piece {
        Piece::Text(text) => {
            out.push_str(&text.replace(['<', '>', '&', '{', '}'], ""));
        }
        Piece::Interpolation(expr) => {
            out.push_str("{{");
            out.push_str(pick(EXPRS, *expr));
            out.push_str("}}");
        }
        Piece::Element { directive, expr, children } => {
            out.push_str("<span ");
            out.push_str(pick(DIRECTIVES, *directive));
            out.push_str("=\"");
            out.push_str(pick(EXPRS, *expr));
            out.push_str("\">");
            if depth < 8 {
                for child in children {
                    render(child, out, depth + 1);
                }
            }
            out.push_str("</span>");
        }
    }
}

fuzz_target!(|pieces: Vec<Piece>| {
    let mut markup = String::from("<div id=\"app\">");
    for piece in &pieces {
        render(piece, &mut markup, 0);
    }
    markup.push_str("</div>");

    let Ok(dom) = Dom::parse(&markup) else {
        return;
    };
    let options = Options::new()
        .attach("#app")
        .state(json!({ "a": 1, "b": { "c": "x" } }))
        .method("noop", |_, _| Ok(()));
    let Ok(vm) = ViewModel::new(dom.clone(), options) else {
        return;
    };
    let _ = vm.set("a", 2);
    let _ = vm.set_path("b.c", "y");
    let _ = vm.set("b", Value::from(json!({ "c": "z" })));
});
