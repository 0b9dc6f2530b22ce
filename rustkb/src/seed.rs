//! Built-in offline corpus
//!
//! Loaded right after `initialize()` so the offline tools have answers
//! before any fetcher has run. Uses only the public store insert
//! operations, exactly like the fetchers do.

use crate::error::Result;
use crate::store::{NewDocument, NewErrorSolution, NewPattern, Store};

/// Counts of records loaded by [`load_builtin`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedStats {
    pub documents: usize,
    pub patterns: usize,
    pub solutions: usize,
}

/// Load the built-in corpus into an initialized store
pub fn load_builtin(store: &Store) -> Result<SeedStats> {
    let mut stats = SeedStats::default();

    for doc in builtin_documents() {
        store.insert_document(&doc)?;
        stats.documents += 1;
    }
    for pattern in builtin_patterns() {
        store.insert_pattern(&pattern)?;
        stats.patterns += 1;
    }
    for solution in builtin_error_solutions() {
        store.insert_error_solution(&solution)?;
        stats.solutions += 1;
    }

    tracing::info!(
        documents = stats.documents,
        patterns = stats.patterns,
        solutions = stats.solutions,
        "builtin corpus loaded"
    );
    Ok(stats)
}

fn doc(
    crate_name: &str,
    version: &str,
    title: &str,
    content: &str,
    category: &str,
    framework: &str,
    tags: &[&str],
    examples: &[&str],
) -> NewDocument {
    NewDocument {
        crate_name: crate_name.to_string(),
        version: version.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        category: category.to_string(),
        framework: framework.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        examples: examples.iter().map(|e| e.to_string()).collect(),
    }
}

fn builtin_documents() -> Vec<NewDocument> {
    vec![
        doc(
            "leptos",
            "0.6",
            "Reactive signals",
            "Signals are the unit of reactivity in Leptos. create_signal returns a \
             getter/setter pair; reading the getter inside a reactive scope subscribes \
             the scope, and calling the setter re-runs every subscriber.",
            "reactivity",
            "leptos",
            &["signals", "reactivity", "state"],
            &["let (count, set_count) = create_signal(0);\nset_count.update(|n| *n += 1);"],
        ),
        doc(
            "leptos",
            "0.6",
            "Components and the view macro",
            "A component is a function annotated with #[component] returning impl \
             IntoView. The view! macro builds the DOM tree; dynamic parts are closures \
             so they re-render when the signals they read change.",
            "components",
            "leptos",
            &["components", "view", "macros"],
            &["#[component]\nfn Counter() -> impl IntoView {\n    let (count, set_count) = create_signal(0);\n    view! { <button on:click=move |_| set_count.update(|n| *n += 1)>{count}</button> }\n}"],
        ),
        doc(
            "leptos",
            "0.6",
            "Server functions",
            "#[server] functions run on the server but are callable from the client. \
             Arguments and return values must serialize; errors travel as ServerFnError.",
            "server",
            "leptos",
            &["server-functions", "ssr"],
            &["#[server]\nasync fn load_rows() -> Result<Vec<Row>, ServerFnError> {\n    Ok(query_rows().await?)\n}"],
        ),
        doc(
            "tauri",
            "2.0",
            "Commands and invoke",
            "A #[tauri::command] function is callable from the webview via invoke(). \
             Commands must be registered in tauri::generate_handler! or the call fails \
             at runtime with a missing-command error.",
            "commands",
            "tauri",
            &["commands", "ipc", "invoke"],
            &["#[tauri::command]\nfn greet(name: &str) -> String {\n    format!(\"Hello, {name}!\")\n}"],
        ),
        doc(
            "tauri",
            "2.0",
            "Managed state",
            "tauri::State gives commands shared access to values registered with \
             .manage(). Interior mutability (Mutex, RwLock) is required for writes \
             because commands borrow state immutably.",
            "state",
            "tauri",
            &["state", "manage", "concurrency"],
            &["#[tauri::command]\nfn bump(counter: tauri::State<Counter>) -> u64 {\n    counter.0.fetch_add(1, Ordering::SeqCst)\n}"],
        ),
        doc(
            "axum",
            "0.7",
            "Extractors",
            "Handler arguments are extractors: Path, Query, Json, State and friends \
             pull typed data out of the request. Order matters only in that the body \
             extractor must come last.",
            "routing",
            "axum",
            &["extractors", "handlers", "routing"],
            &["async fn show(Path(id): Path<u64>, State(db): State<Db>) -> Json<Row> {\n    Json(db.get(id).await)\n}"],
        ),
    ]
}

fn pattern(
    name: &str,
    description: &str,
    code_template: &str,
    framework: &str,
    category: &str,
) -> NewPattern {
    NewPattern {
        name: name.to_string(),
        description: description.to_string(),
        code_template: code_template.to_string(),
        framework: framework.to_string(),
        category: category.to_string(),
    }
}

fn builtin_patterns() -> Vec<NewPattern> {
    vec![
        pattern(
            "counter-component",
            "Minimal stateful component with a click handler",
            "#[component]\nfn Counter() -> impl IntoView {\n    let (count, set_count) = create_signal(0);\n    view! {\n        <button on:click=move |_| set_count.update(|n| *n += 1)>\n            \"Count: \" {count}\n        </button>\n    }\n}",
            "leptos",
            "components",
        ),
        pattern(
            "derived-signal",
            "Compute a value from other signals without re-running eagerly",
            "let (price, _) = create_signal(10.0);\nlet (qty, _) = create_signal(2);\nlet total = move || price.get() * qty.get() as f64;",
            "leptos",
            "reactivity",
        ),
        pattern(
            "async-resource",
            "Load data asynchronously and render fallback while pending",
            "let rows = create_resource(|| (), |_| async { load_rows().await });\nview! {\n    <Suspense fallback=|| view! { <p>\"Loading…\"</p> }>\n        {move || rows.get().map(|r| format!(\"{} rows\", r.len()))}\n    </Suspense>\n}",
            "leptos",
            "async",
        ),
        pattern(
            "invoke-command",
            "Define a command and register it with the builder",
            "#[tauri::command]\nfn greet(name: &str) -> String {\n    format!(\"Hello, {name}!\")\n}\n\nfn main() {\n    tauri::Builder::default()\n        .invoke_handler(tauri::generate_handler![greet])\n        .run(tauri::generate_context!())\n        .expect(\"error while running tauri application\");\n}",
            "tauri",
            "commands",
        ),
        pattern(
            "shared-state",
            "Share mutable state across commands with manage()",
            "struct Counter(AtomicU64);\n\nfn main() {\n    tauri::Builder::default()\n        .manage(Counter(AtomicU64::new(0)))\n        .invoke_handler(tauri::generate_handler![bump])\n        .run(tauri::generate_context!())\n        .expect(\"error while running tauri application\");\n}",
            "tauri",
            "state",
        ),
        pattern(
            "router-with-state",
            "Build a router whose handlers share application state",
            "let app = Router::new()\n    .route(\"/rows/:id\", get(show))\n    .with_state(db.clone());",
            "axum",
            "routing",
        ),
    ]
}

fn solution(
    error_pattern: &str,
    solution: &str,
    example_fix: Option<&str>,
    framework: Option<&str>,
) -> NewErrorSolution {
    NewErrorSolution {
        error_pattern: error_pattern.to_string(),
        solution: solution.to_string(),
        example_fix: example_fix.map(|s| s.to_string()),
        framework: framework.map(|s| s.to_string()),
    }
}

fn builtin_error_solutions() -> Vec<NewErrorSolution> {
    vec![
        solution(
            "error[E0382]: borrow of moved value",
            "The value was moved into a closure or call and used again afterwards. \
             Clone before the move, or restructure so only one owner needs it.",
            Some("let name_for_closure = name.clone();\nlet on_click = move |_| greet(&name_for_closure);"),
            None,
        ),
        solution(
            "error[E0499]: cannot borrow",
            "Two mutable borrows overlap. Narrow the first borrow's scope with a \
             block, or split the data so each part has its own borrow.",
            None,
            None,
        ),
        solution(
            "error[E0277]: `…` cannot be sent between threads safely",
            "A non-Send value crosses an await or thread boundary. Drop it before \
             the await, or wrap it in Arc<Mutex<_>> if it genuinely must be shared.",
            None,
            None,
        ),
        solution(
            "cannot find macro `view` in this scope",
            "Import the prelude: use leptos::*; the view! macro lives there.",
            Some("use leptos::*;"),
            Some("leptos"),
        ),
        solution(
            "reactive value accessed outside of reactive context",
            "Signal getters must run inside a reactive scope. Wrap the read in a \
             closure passed to the view, not evaluated once at build time.",
            Some("view! { <p>{move || count.get()}</p> }"),
            Some("leptos"),
        ),
        solution(
            "Unhandled Promise Rejection: invoke error: command not found",
            "The command is not registered. Add it to tauri::generate_handler! in \
             the builder's invoke_handler call; names are case-sensitive.",
            Some(".invoke_handler(tauri::generate_handler![greet, bump])"),
            Some("tauri"),
        ),
    ]
}
