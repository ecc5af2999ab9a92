/// Forwards window focus and page visibility to Rust as `"focus"`,
/// `"visible"` and `"hidden"`. A second mount replaces the first listeners.
pub(super) const PAGE_EVENTS_SCRIPT: &str = r#"(function() {
    if (window.__testsetPageEvents) {
        window.__testsetPageEvents.abort();
    }
    const controller = new AbortController();
    window.__testsetPageEvents = controller;
    const options = { signal: controller.signal };
    window.addEventListener("focus", () => dioxus.send("focus"), options);
    document.addEventListener("visibilitychange", () => {
        dioxus.send(document.visibilityState === "visible" ? "visible" : "hidden");
    }, options);
})();"#;

