//! Integration tests for template resolution
//!
//! These tests exercise name parsing, layered lookup, rewriting and the
//! update path together, against real directories.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::event::{DataChange, ModifyKind};
use notify::{Event, EventKind};
use tempfile::TempDir;
use tplex::TokenKind;
use viewloader::config::ModuleConfig;
use viewloader::events::EventBus;
use viewloader::{
    LoaderConfig, LoaderRegistry, ModuleViewFolders, PathResolver, ResolverOptions, UPDATE_EVENT,
    ViewFolderResolver, reference, rewrite, watch,
};

fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn no_folders() -> Arc<dyn ViewFolderResolver> {
    Arc::new(HashMap::<String, Vec<PathBuf>>::new())
}

fn record_updates(bus: &EventBus) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.on(UPDATE_EVENT, move |name| {
        sink.lock().unwrap().push(name.to_string());
        Ok(())
    });
    seen
}

fn changed(path: &Path) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.to_path_buf())
}

/// Concatenate the string literals that follow `include` in a rewritten block
fn include_target(source: &str) -> String {
    let tokens = tplex::tokenize(source).unwrap();
    let start = tokens.iter().position(|t| t.is_symbol("include")).unwrap();
    tokens[start + 1..]
        .iter()
        .take_while(|t| t.kind != TokenKind::BlockEnd)
        .filter(|t| t.kind == TokenKind::String)
        .map(|t| t.value.as_str())
        .collect()
}

/// A site with one project override and two modules, `blog` extending `base`
struct Site {
    _root: TempDir,
    folders: Arc<ModuleViewFolders>,
    project_root: PathBuf,
}

fn site() -> Site {
    let root = TempDir::new().unwrap();
    let project_root = root.path().to_path_buf();
    let base_dir = project_root.join("node_modules/base");
    let blog_dir = project_root.join("node_modules/blog");

    write(&base_dir, "views/layout.html", "base layout");
    write(&blog_dir, "views/show.html", r#"{% extends "layout.html" %}{% include "nav.html" %}"#);
    write(&blog_dir, "views/nav.html", "module nav");
    write(&project_root, "lib/modules/blog/views/nav.html", "project nav");

    let folders = Arc::new(ModuleViewFolders::new(
        &project_root,
        [
            ModuleConfig {
                name: "base".to_string(),
                dir: Some(base_dir),
                extends: None,
            },
            ModuleConfig {
                name: "blog".to_string(),
                dir: Some(blog_dir),
                extends: Some("base".to_string()),
            },
        ],
    ));
    Site {
        _root: root,
        folders,
        project_root,
    }
}

// =============================================================================
// Name parsing
// =============================================================================

#[test]
fn test_parse_properties() {
    let r = reference::parse("a:b/c.html");
    assert_eq!((r.module.as_deref(), r.residual.as_str()), (Some("a"), "b/c.html"));

    let r = reference::parse("a:b:c.html");
    assert_eq!((r.module.as_deref(), r.residual.as_str()), (Some("b"), "c.html"));

    let r = reference::parse("plain/path.html");
    assert_eq!((r.module.as_deref(), r.residual.as_str()), (None, "plain/path.html"));
}

// =============================================================================
// Flat resolution
// =============================================================================

#[test]
fn test_earlier_search_path_shadows_later() {
    let d1 = TempDir::new().unwrap();
    let d2 = TempDir::new().unwrap();
    write(d1.path(), "x.html", "from d1");
    write(d2.path(), "x.html", "from d2");

    let resolver = PathResolver::new(
        vec![d1.path().to_path_buf(), d2.path().to_path_buf()],
        no_folders(),
        ResolverOptions::unwatched(),
    );
    assert_eq!(resolver.get_source("x.html").unwrap().unwrap().source, "from d1");
}

#[test]
fn test_missing_template_is_absent() {
    let d1 = TempDir::new().unwrap();
    write(d1.path(), "x.html", "x");
    let resolver = PathResolver::new(vec![d1.path().to_path_buf()], no_folders(), ResolverOptions::unwatched());
    assert!(resolver.get_source("missingfile.html").unwrap().is_none());
}

// =============================================================================
// Rewriting
// =============================================================================

#[test]
fn test_rewrite_without_directives_is_identity() {
    assert_eq!(rewrite("plain text, no directives", "mod").unwrap(), "plain text, no directives");
}

#[test]
fn test_rewrite_identity_corpus() {
    let corpus = [
        "",
        "<html>\n  <body>{{ content | safe }}</body>\n</html>\n",
        "{% if user %}Hi {{ user.name }}{% else %}Hello{% endif %}",
        "{% for item in items %}\n  <li>{{ loop.index }}: {{ item }}</li>\n{% endfor %}",
        "{%- set x = [1, 2.5, true, none] -%}{{ x | join(\", \") }}",
        "{# a comment with {% include \"x.html\" %} inside #}",
        "{% macro field(name, label=\"Name\") %}<input name=\"{{ name }}\">{% endmacro %}",
        "{% block main %}{{ super() }}{% endblock %}",
        "{% raw %}{% include \"x.html\" %}{{ y }}{% endraw %}",
        "{{ a == b and c != d or e >= 1 }}{{ 7 // 2 }}{{ 2 ** 3 }}",
    ];
    for source in corpus {
        assert_eq!(rewrite(source, "mod").unwrap(), source, "source: {:?}", source);
    }
}

#[test]
fn test_rewritten_include_targets_module() {
    let rewritten = rewrite(r#"{% include "foo.html" %}"#, "blog").unwrap();
    let target = include_target(&rewritten);
    assert_eq!(target, "blog:foo.html");

    let r = reference::parse(&target);
    assert_eq!(r.module.as_deref(), Some("blog"));
    assert_eq!(r.residual, "foo.html");
}

#[test]
fn test_explicit_namespace_survives_rewrite() {
    let rewritten = rewrite(r#"{% include "forms:field.html" %}"#, "blog").unwrap();
    let r = reference::parse(&include_target(&rewritten));
    assert_eq!(r.module.as_deref(), Some("forms"));
    assert_eq!(r.residual, "field.html");
}

// =============================================================================
// Namespaced resolution
// =============================================================================

#[test]
fn test_namespaced_lookup_rewrites_and_honors_overrides() {
    let site = site();
    let resolver = PathResolver::new(vec![], site.folders.clone(), ResolverOptions::unwatched());

    let show = resolver.get_source("blog:show.html").unwrap().unwrap();
    assert_eq!(
        show.source,
        r#"{% extends "blog:" + "layout.html" %}{% include "blog:" + "nav.html" %}"#
    );

    // Project-level override wins over the module's own copy
    let nav = resolver.get_source("blog:nav.html").unwrap().unwrap();
    assert_eq!(nav.source, "project nav");
    assert_eq!(nav.path, site.project_root.join("lib/modules/blog/views/nav.html"));

    // Inherited from the parent module
    let layout = resolver.get_source("blog:layout.html").unwrap().unwrap();
    assert_eq!(layout.source, "base layout");
}

#[test]
fn test_unknown_module_is_absent() {
    let site = site();
    let resolver = PathResolver::new(vec![], site.folders.clone(), ResolverOptions::unwatched());
    assert!(resolver.get_source("nope:show.html").unwrap().is_none());
}

#[test]
fn test_registry_chain_resolves_module_names() {
    let site = site();
    let config = LoaderConfig {
        no_watch: true,
        ..Default::default()
    };
    let registry = LoaderRegistry::new(config, site.folders.clone());

    let chain = registry.chain_for("blog", &["base"]);
    assert_eq!(chain.get_source("nav.html").unwrap().unwrap().source, "project nav");
    assert_eq!(chain.get_source("layout.html").unwrap().unwrap().source, "base layout");
    assert_eq!(registry.len(), 2);

    registry.dispose();
    assert!(registry.is_empty());
}

// =============================================================================
// Update events
// =============================================================================

#[test]
fn test_change_to_resolved_path_emits_once_with_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x.html", "x");
    let resolver = PathResolver::new(vec![dir.path().to_path_buf()], no_folders(), ResolverOptions::unwatched());
    let seen = record_updates(resolver.bus());

    let found = resolver.get_source("x.html").unwrap().unwrap();
    let search_dir = resolver.search_paths()[0].clone();
    let emitted = watch::dispatch(&search_dir, &changed(&found.path), resolver.mapping(), resolver.bus());

    assert_eq!(emitted, 1);
    assert_eq!(*seen.lock().unwrap(), vec!["x.html"]);
}

#[test]
fn test_change_to_unresolved_path_emits_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x.html", "x");
    let other = write(dir.path(), "other.html", "o");
    let resolver = PathResolver::new(vec![dir.path().to_path_buf()], no_folders(), ResolverOptions::unwatched());
    let seen = record_updates(resolver.bus());

    resolver.get_source("x.html").unwrap();
    let search_dir = resolver.search_paths()[0].clone();
    let emitted = watch::dispatch(&search_dir, &changed(&other), resolver.mapping(), resolver.bus());

    assert_eq!(emitted, 0);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_subscribers_called_in_order() {
    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["A", "B", "C"] {
        let order = Arc::clone(&order);
        bus.on(UPDATE_EVENT, move |_| {
            order.lock().unwrap().push(tag);
            Ok(())
        });
    }
    bus.emit(UPDATE_EVENT, "x.html").unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["A", "B", "C"]);
}
