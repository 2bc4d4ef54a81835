//! End-to-end workflows driven through scripted prompts.

use page_registry::commands::add_helpers::{self, AddHelpers};
use page_registry::commands::cleanup::{self, Cleanup};
use page_registry::commands::create_registry::{self, CreateRegistry};
use page_registry::commands::remove_helper::{self, RemoveHelper};
use page_registry::commands::use_helper::{self, UseHelper};
use page_registry::commands::{Outcome, Session};
use page_registry::prompt::{Answer, Level};
use page_registry::rewriter::{self, SkipReason};
use page_registry::{Config, PreferenceStore, ScriptedPrompter, analyzer, registry};
use std::fs;
use std::path::{Path, PathBuf};

fn session(root: &Path, answers: Vec<Answer>) -> Session<ScriptedPrompter> {
    Session::new(
        root,
        Config::default(),
        PreferenceStore::in_memory(),
        ScriptedPrompter::new(answers),
    )
}

fn create_main_factory(root: &Path) -> PathBuf {
    let mut session = session(
        root,
        vec![
            Answer::Directory(Some(PathBuf::from("pages"))),
            Answer::Text(Some("MainFactory".to_string())),
        ],
    );
    let outcome = create_registry::run(&mut session, CreateRegistry::default()).unwrap();
    assert_eq!(outcome, Outcome::Completed);
    root.join("pages/main-factory.ts")
}

#[test]
fn fresh_registry_has_singleton_and_placeholder_only() {
    let dir = tempfile::tempdir().unwrap();
    let registry_path = create_main_factory(dir.path());
    let text = fs::read_to_string(&registry_path).unwrap();

    assert_eq!(text.matches("private static instance: MainFactory;").count(), 1);
    assert_eq!(text.matches("public static getInstance(): MainFactory {").count(), 1);
    assert_eq!(text.matches("// page-registry: accessors").count(), 1);

    let zones = registry::parse(&text);
    assert!(zones.helper_accessors().is_empty());
    assert!(zones.fields.iter().all(|f| f.is_static || f.name == "page"));
}

#[test]
fn adding_a_helper_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let registry_path = create_main_factory(dir.path());
    let login = dir.path().join("pages/Login.page.ts");
    fs::write(&login, "export class LoginPage {}\n").unwrap();
    let config = Config::default();

    let first = rewriter::apply_helper_additions(
        &registry_path,
        std::slice::from_ref(&login),
        dir.path(),
        &config,
    )
    .unwrap();
    assert_eq!(first.added, vec!["LoginPage"]);
    let after_first = fs::read_to_string(&registry_path).unwrap();

    insta::assert_snapshot!(after_first, @r"
import type { Page } from '@playwright/test';
import { LoginPage } from './Login.page';

export class MainFactory {
    private static instance: MainFactory;
    private page?: Page;

    private _loginPage?: LoginPage;

    private constructor() {}

    public static getInstance(): MainFactory {
        if (!MainFactory.instance) {
            MainFactory.instance = new MainFactory();
        }
        return MainFactory.instance;
    }

    public setPage(page: Page): void {
        this.page = page;
    }

    public getLoginPage(page?: Page): LoginPage {
        if (!this._loginPage) {
            this._loginPage = new LoginPage(page ?? this.page);
        }
        return this._loginPage;
    }

    // page-registry: accessors
}

export const getMainFactory = (): MainFactory => MainFactory.getInstance();
export const getLoginPage = (page?: Page): LoginPage => MainFactory.getInstance().getLoginPage(page);
");

    let second =
        rewriter::apply_helper_additions(&registry_path, &[login], dir.path(), &config).unwrap();
    assert!(second.added.is_empty());
    assert_eq!(second.skipped_names(), vec!["LoginPage"]);
    assert_eq!(fs::read_to_string(&registry_path).unwrap(), after_first);
}

#[test]
fn same_class_in_two_files_is_a_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let registry_path = create_main_factory(dir.path());
    let first = dir.path().join("pages/auth/login.page.ts");
    let second = dir.path().join("pages/legacy/login.page.ts");
    for file in [&first, &second] {
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, "export class LoginPage {}\n").unwrap();
    }
    let config = Config::default();

    rewriter::apply_helper_additions(&registry_path, &[first], dir.path(), &config).unwrap();
    let report =
        rewriter::apply_helper_additions(&registry_path, &[second], dir.path(), &config).unwrap();

    assert!(report.added.is_empty());
    assert_eq!(report.skipped[0].reason, SkipReason::Duplicate);
}

#[test]
fn helper_lifecycle_from_add_to_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let registry_path = create_main_factory(root);
    fs::write(root.join("pages/login.page.ts"), "export class LoginPage {}\n").unwrap();
    fs::write(root.join("pages/cart.page.ts"), "export class CartPage {}\n").unwrap();
    fs::create_dir_all(root.join("tests")).unwrap();
    let spec = root.join("tests/login.spec.ts");
    fs::write(&spec, "test('login', async () => {\n});\n").unwrap();

    // Pick both candidates (CartPage, LoginPage by name).
    let mut s = session(root, vec![Answer::Files(Some(vec![0, 1]))]);
    add_helpers::run(&mut s, AddHelpers::default()).unwrap();
    assert!(s.ui.said(Level::Success, "Added CartPage, LoginPage"));
    assert_eq!(s.ui.remaining(), 0);

    let mut s = session(root, vec![]);
    let usage = UseHelper {
        file: PathBuf::from("tests/login.spec.ts"),
        line: 2,
        accessor: Some("getLoginPage".to_string()),
        registry: None,
    };
    use_helper::run(&mut s, usage).unwrap();
    assert!(fs::read_to_string(&spec).unwrap().contains("const loginPage = getLoginPage();"));

    // LoginPage is used by the login test, so its file may not be deleted.
    let mut s = session(root, vec![]);
    let removal = RemoveHelper {
        classes: vec!["LoginPage".to_string()],
        delete_file: true,
        yes: true,
        ..RemoveHelper::default()
    };
    assert!(remove_helper::run(&mut s, removal).is_err());
    assert!(root.join("pages/login.page.ts").exists());

    // CartPage disappears from disk and is cleaned up.
    fs::remove_file(root.join("pages/cart.page.ts")).unwrap();
    let report = analyzer::validate_workspace(root, &Config::default(), &PreferenceStore::in_memory())
        .unwrap();
    assert!(report.has_errors());

    let mut s = session(root, vec![]);
    cleanup::run(
        &mut s,
        Cleanup {
            registry: None,
            yes: true,
        },
    )
    .unwrap();

    let text = fs::read_to_string(&registry_path).unwrap();
    assert!(!text.contains("CartPage"));
    assert!(text.contains("getLoginPage"));
    let report = analyzer::validate_workspace(root, &Config::default(), &PreferenceStore::in_memory())
        .unwrap();
    assert!(!report.has_errors(), "{:?}", report.findings);
}

#[test]
fn cancelling_any_prompt_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let registry_path = create_main_factory(root);
    fs::write(root.join("pages/login.page.ts"), "export class LoginPage {}\n").unwrap();
    let before = fs::read(&registry_path).unwrap();

    let mut s = session(root, vec![Answer::Files(None)]);
    assert_eq!(add_helpers::run(&mut s, AddHelpers::default()).unwrap(), Outcome::Cancelled);
    assert!(s.prefs.list().is_empty());

    let mut s = session(root, vec![Answer::Directory(None)]);
    assert_eq!(
        create_registry::run(&mut s, CreateRegistry::default()).unwrap(),
        Outcome::Cancelled
    );

    assert_eq!(fs::read(&registry_path).unwrap(), before);
    assert_eq!(fs::read_dir(root.join("pages")).unwrap().count(), 2);
}

#[test]
fn hand_edited_registry_accepts_new_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registries/hand-edited.ts");
    let registry_path = dir.path().join("app/app-pages.ts");
    fs::create_dir_all(registry_path.parent().unwrap()).unwrap();
    fs::copy(&fixture, &registry_path).unwrap();
    let cart = dir.path().join("app/cart.page.ts");
    fs::write(&cart, "export class CartPage {}\n").unwrap();

    let report =
        rewriter::apply_helper_additions(&registry_path, &[cart], dir.path(), &Config::default())
            .unwrap();
    assert_eq!(report.added, vec!["CartPage"]);

    let zones = registry::parse(&fs::read_to_string(&registry_path).unwrap());
    assert!(zones.imports_class("CartPage"));
    assert!(zones.has_field("_cartPage"));
    assert!(zones.accessor("getCartPage").is_some());
    assert!(zones.imports_class("ProfileOptions"));
}
