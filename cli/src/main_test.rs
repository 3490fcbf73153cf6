use super::*;
use milsabores::validation::PASSWORD_MISMATCH_MESSAGE;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("milsabores").chain(args.iter().copied())).unwrap()
}

fn register_args(confirm: &str) -> RegisterArgs {
    RegisterArgs {
        email: "ana@milsabores.cl".into(),
        password: "secreto1".into(),
        confirm_password: confirm.into(),
        nombre: "Ana".into(),
        apellido: None,
        telefono: None,
    }
}

#[test]
fn register_rejects_mismatched_confirmation() {
    let err = registration_form(register_args("otra-clave")).unwrap_err();
    let CliError::Validation(error) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(error.field, "confirm_password");
    assert_eq!(error.message, PASSWORD_MISMATCH_MESSAGE);
}

#[test]
fn register_accepts_matching_confirmation() {
    let form = registration_form(register_args("secreto1")).unwrap();
    assert_eq!(form.email, "ana@milsabores.cl");
    assert_eq!(form.password, "secreto1");
}

#[test]
fn register_command_takes_confirm_password() {
    let cli = parse(&[
        "register",
        "--email",
        "ana@milsabores.cl",
        "--password",
        "secreto1",
        "--confirm-password",
        "secreto2",
        "--nombre",
        "Ana",
    ]);
    let Command::Register(args) = cli.command else {
        panic!("expected register command");
    };
    assert_eq!(args.confirm_password, "secreto2");
}

#[test]
fn products_create_parses_json_draft() {
    let cli = parse(&["products", "create", "--data", r#"{"nombre":"Torta","precio":12990,"stock":4}"#]);
    let Command::Products(ProductsCommand { command: ProductsSubcommand::Create { data } }) = cli.command else {
        panic!("expected products create");
    };

    let draft = parse_draft(&data).unwrap();

    assert_eq!(draft.nombre, "Torta");
    assert!((draft.precio - 12990.0).abs() < f64::EPSILON);
    assert_eq!(draft.stock, Some(4));
    assert_eq!(draft.categoria, None);
}

#[test]
fn products_update_and_delete_take_ids() {
    let cli = parse(&["products", "update", "7", "--data", r#"{"nombre":"Kuchen","precio":8990}"#]);
    assert!(matches!(
        cli.command,
        Command::Products(ProductsCommand { command: ProductsSubcommand::Update { ref id, .. } }) if id == "7"
    ));

    let cli = parse(&["products", "delete", "7"]);
    assert!(matches!(
        cli.command,
        Command::Products(ProductsCommand { command: ProductsSubcommand::Delete { ref id } }) if id == "7"
    ));
}

#[test]
fn malformed_draft_is_rejected() {
    assert!(matches!(parse_draft("{\"nombre\":"), Err(CliError::InvalidJson(_))));
    assert!(matches!(parse_draft("{\"precio\":1}"), Err(CliError::InvalidJson(_))));
}

#[test]
fn ping_is_a_subcommand() {
    assert!(matches!(parse(&["ping"]).command, Command::Ping));
}
