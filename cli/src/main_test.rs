use clap::CommandFactory;

use super::*;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_review_create() {
    let cli = Cli::try_parse_from([
        "kniga-cli", "review", "create", "7", "--rating", "5", "--title", "Отлично", "--content", "Читать всем",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Command::Review(ReviewCommand { command: ReviewSubcommand::Create { book_id: 7, rating: 5, .. } })
    ));
    assert!(!cli.yes);
}

#[test]
fn yes_flag_is_global() {
    let cli = Cli::try_parse_from(["kniga-cli", "admin", "delete-book", "3", "--yes"]).unwrap();
    assert!(cli.yes);
}

#[test]
fn api_url_defaults_to_local_backend() {
    let cli = Cli::try_parse_from(["kniga-cli", "categories"]).unwrap();
    assert_eq!(cli.api_url, DEFAULT_API_URL);
}

#[test]
fn error_notice_fails_the_command() {
    let err = report(Notice::error("Не удалось создать книгу")).unwrap_err();
    assert_eq!(err.to_string(), "Не удалось создать книгу");
    assert!(report(Notice::success("Книга успешно создана")).is_ok());
}

#[test]
fn declined_confirmation_is_cancelled() {
    assert!(matches!(confirmed(None), Err(CliError::Cancelled)));
}
