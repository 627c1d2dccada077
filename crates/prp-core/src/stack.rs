//! Tech-stack detection from the files at a project's top level, and the
//! `PRPs/ai_docs/` pattern documents suggested for each detected technology.

use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// TechStack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Frontend,
    Backend,
    Database,
    Tools,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Frontend,
        Category::Backend,
        Category::Database,
        Category::Tools,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Frontend => "Frontend",
            Category::Backend => "Backend",
            Category::Database => "Database",
            Category::Tools => "Tools",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechStack(BTreeMap<Category, BTreeSet<String>>);

impl TechStack {
    pub fn add(&mut self, category: Category, label: &str) {
        self.0.entry(category).or_default().insert(label.to_string());
    }

    pub fn get(&self, category: Category) -> impl Iterator<Item = &str> {
        self.0.get(&category).into_iter().flatten().map(String::as_str)
    }

    pub fn contains(&self, category: Category, label: &str) -> bool {
        self.0.get(&category).is_some_and(|set| set.contains(label))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &BTreeSet<String>)> {
        self.0.iter().map(|(c, set)| (*c, set))
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

const FRONTEND_DEPS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue"),
    ("angular", "Angular"),
    ("@angular/core", "Angular"),
    ("next", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("tailwindcss", "Tailwind CSS"),
    ("@mui/material", "Material-UI"),
    ("@chakra-ui/react", "Chakra UI"),
    ("antd", "Ant Design"),
    ("redux", "Redux"),
    ("zustand", "Zustand"),
    ("@tanstack/react-query", "TanStack Query"),
];

const BACKEND_DEPS: &[(&str, &str)] = &[
    ("express", "Express"),
    ("fastify", "Fastify"),
    ("koa", "Koa"),
    ("nest", "NestJS"),
    ("@nestjs/core", "NestJS"),
];

const TOOL_DEPS: &[(&str, &str)] = &[("typescript", "TypeScript"), ("jest", "Jest")];

const PYTHON_PACKAGES: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("celery", "Celery"),
];

const DATABASE_DIRS: &[(&str, &str)] = &[
    ("supabase", "Supabase"),
    ("prisma", "Prisma"),
    ("migrations", "Database Migrations"),
];

const COMPOSE_SERVICES: &[(&str, &str)] = &[
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
];

const TOOL_CONFIGS: &[(&str, &str)] = &[
    ("vite.config.js", "Vite"),
    ("vite.config.ts", "Vite"),
    ("webpack.config.js", "Webpack"),
    ("rollup.config.js", "Rollup"),
    ("jest.config.js", "Jest"),
    ("cypress.config.js", "Cypress"),
    ("playwright.config.js", "Playwright"),
];

fn has_file(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

fn has_dir(dir: &Path, name: &str) -> bool {
    dir.join(name).is_dir()
}

/// True when any top-level file in `dir` has extension `ext`.
fn has_extension(dir: &Path, ext: &str) -> bool {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .any(|e| e.path().is_file() && e.path().extension().is_some_and(|x| x == ext))
}

fn read_lowercase(dir: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(name))
        .ok()
        .map(|s| s.to_lowercase())
}

/// Names in `dependencies` and `devDependencies`. An unreadable or
/// unparsable `package.json` yields nothing.
fn package_deps(dir: &Path) -> BTreeSet<String> {
    let Ok(content) = std::fs::read_to_string(dir.join("package.json")) else {
        return BTreeSet::new();
    };
    let json = match serde_json::from_str::<Value>(&content) {
        Ok(json) => json,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparsable package.json");
            return BTreeSet::new();
        }
    };
    ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|key| json.get(*key).and_then(Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

/// Detect the technologies used by the project rooted at `dir`.
pub fn scan(dir: &Path) -> TechStack {
    let mut stack = TechStack::default();

    let deps = package_deps(dir);
    for (table, category) in [
        (FRONTEND_DEPS, Category::Frontend),
        (BACKEND_DEPS, Category::Backend),
        (TOOL_DEPS, Category::Tools),
    ] {
        for (dep, label) in table {
            if deps.contains(*dep) {
                stack.add(category, label);
            }
        }
    }

    if has_extension(dir, "py") || has_file(dir, "pyproject.toml") {
        stack.add(Category::Backend, "Python");
    }
    if let Some(requirements) = read_lowercase(dir, "requirements.txt") {
        for (needle, label) in PYTHON_PACKAGES {
            if requirements.contains(needle) {
                stack.add(Category::Backend, label);
            }
        }
    }
    if has_extension(dir, "go") {
        stack.add(Category::Backend, "Go");
    }
    if has_extension(dir, "rs") || has_file(dir, "Cargo.toml") {
        stack.add(Category::Backend, "Rust");
    }

    for (name, label) in DATABASE_DIRS {
        if has_dir(dir, name) {
            stack.add(Category::Database, label);
        }
    }
    if has_extension(dir, "sql") {
        stack.add(Category::Database, "SQL");
    }
    if let Some(compose) = read_lowercase(dir, "docker-compose.yml") {
        for (needle, label) in COMPOSE_SERVICES {
            if compose.contains(needle) {
                stack.add(Category::Database, label);
            }
        }
    }

    for (name, label) in TOOL_CONFIGS {
        if has_file(dir, name) {
            stack.add(Category::Tools, label);
        }
    }

    stack
}

// ---------------------------------------------------------------------------
// ai_docs suggestions
// ---------------------------------------------------------------------------

fn docs_for(label: &str) -> &'static [&'static str] {
    match label {
        "React" => &[
            "react-typescript-conventions.md",
            "react-hooks-patterns.md",
            "react-component-patterns.md",
        ],
        "Vue" => &["vue-composition-patterns.md", "vue-options-patterns.md"],
        "Angular" => &["angular-patterns.md", "angular-services-patterns.md"],
        "Next.js" => &["nextjs-patterns.md", "nextjs-routing-patterns.md"],
        "Tailwind CSS" => &["tailwind-patterns.md"],
        "Material-UI" => &["mui-patterns.md"],
        "Redux" => &["redux-patterns.md"],
        "Zustand" => &["zustand-patterns.md"],
        "TanStack Query" => &["react-query-patterns.md"],
        "Express" => &[
            "express-patterns.md",
            "nodejs-patterns.md",
            "express-middleware-patterns.md",
        ],
        "NestJS" => &["nestjs-patterns.md", "nestjs-module-patterns.md"],
        "Django" => &[
            "django-patterns.md",
            "django-models-patterns.md",
            "django-views-patterns.md",
        ],
        "Flask" => &["flask-patterns.md", "flask-blueprint-patterns.md"],
        "FastAPI" => &["fastapi-patterns.md", "fastapi-dependency-patterns.md"],
        "Go" => &["go-patterns.md", "go-http-patterns.md"],
        "Rust" => &["rust-patterns.md", "rust-web-patterns.md"],
        "Supabase" => &[
            "supabase-patterns.md",
            "supabase-auth-patterns.md",
            "supabase-realtime-patterns.md",
        ],
        "Prisma" => &["prisma-patterns.md", "prisma-migration-patterns.md"],
        "PostgreSQL" => &["postgresql-patterns.md"],
        "MongoDB" => &["mongodb-patterns.md"],
        "Redis" => &["redis-patterns.md"],
        "TypeScript" => &["typescript-patterns.md"],
        "Vite" => &["vite-patterns.md"],
        "Jest" => &["jest-testing-patterns.md"],
        "Cypress" => &["cypress-testing-patterns.md"],
        _ => &[],
    }
}

/// Fallback docs offered when nothing specific was detected.
pub const GENERAL_DOCS: &[&str] = &["general-patterns.md", "project-conventions.md"];

pub fn suggest_docs(stack: &TechStack) -> BTreeSet<String> {
    stack
        .iter()
        .flat_map(|(_, labels)| labels.iter())
        .flat_map(|label| docs_for(label).iter())
        .map(|s| s.to_string())
        .collect()
}

/// `react-hooks-patterns.md` → `React Hooks Patterns`.
fn title_from_filename(filename: &str) -> String {
    filename
        .trim_end_matches(".md")
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn doc_template(filename: &str) -> String {
    format!(
        r#"# {title}

## Overview

Brief description of the patterns covered in this document.

## Core Patterns

### Pattern 1: [Pattern Name]
```typescript
// Code example
```

### Pattern 2: [Pattern Name]
```typescript
// Code example
```

## Best Practices
- [ ] Practice 1
- [ ] Practice 2

## Common Pitfalls
- [ ] Pitfall 1 and how to avoid it
- [ ] Pitfall 2 and how to avoid it

## Related Patterns
- Link to related ai_docs files
- Cross-reference with other patterns

## Examples
- Real-world examples from your codebase
- Common use cases and implementations
"#,
        title = title_from_filename(filename)
    )
}

/// Write a template for each suggestion missing from `PRPs/ai_docs/`.
/// Returns the paths written; existing files are left alone.
pub fn create_docs<'a, I>(root: &Path, suggestions: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = &'a String>,
{
    let dir = paths::ai_docs_dir(root);
    let mut created = Vec::new();
    for name in suggestions {
        let path = dir.join(name);
        if io::write_if_missing(&path, doc_template(name).as_bytes())? {
            tracing::info!(path = %path.display(), "created ai_docs template");
            created.push(path);
        }
    }
    Ok(created)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
