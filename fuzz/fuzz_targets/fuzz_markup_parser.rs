#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_dom::Dom;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(dom) = Dom::parse(text) else {
        return;
    };
    // Whatever parses must serialize to markup that parses to the same tree.
    let once = dom.inner_html(dom.document());
    let reparsed = Dom::parse(&once).expect("serialized markup must parse");
    assert_eq!(reparsed.inner_html(reparsed.document()), once);
});
