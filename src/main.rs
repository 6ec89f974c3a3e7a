// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PLAGIARISM CHECK CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// CLI para estimar quanto de um texto já existe online.
//
// Uso:
//   plagiarism-check "Texto a verificar. Outra sentença."
//   plagiarism-check --by paragraph --file artigo.txt
//   cat artigo.txt | plagiarism-check --concurrency 4 --json
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::{bail, Context};
use plagiarism_check::prelude::*;
use plagiarism_check::report::{format_unit_line, write_report};
use plagiarism_check::{
    create_tokio_runtime, install_panic_hook, load_check_config, load_runtime_config,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Opções da linha de comando
#[derive(Debug, Default)]
struct CliArgs {
    granularity: Option<String>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    sequential: bool,
    json: bool,
    file: Option<PathBuf>,
    text: Vec<String>,
}

fn print_usage(program: &str) {
    eprintln!("Plagiarism Check CLI v{}", plagiarism_check::VERSION);
    eprintln!();
    eprintln!("Uso: {} [opções] <texto>", program);
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --by <sentence|paragraph>  Granularidade (padrão: sentence)");
    eprintln!("  --concurrency <n>          Máximo de buscas simultâneas");
    eprintln!("  --sequential               Uma busca por vez");
    eprintln!("  --timeout <segundos>       Deadline da verificação inteira");
    eprintln!("  --file <caminho>           Lê o texto de um arquivo");
    eprintln!("  --json                     Imprime o relatório em JSON");
    eprintln!();
    eprintln!("Sem <texto> nem --file, o texto é lido da entrada padrão.");
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--by" => cli.granularity = Some(iter.next().context("--by requer um valor")?.clone()),
            "--concurrency" => {
                let value = iter.next().context("--concurrency requer um número")?;
                cli.concurrency = Some(value.parse().with_context(|| format!("concorrência inválida: {}", value))?);
            }
            "--timeout" => {
                let value = iter.next().context("--timeout requer segundos")?;
                cli.timeout_secs = Some(value.parse().with_context(|| format!("timeout inválido: {}", value))?);
            }
            "--file" => cli.file = Some(PathBuf::from(iter.next().context("--file requer um caminho")?)),
            "--sequential" => cli.sequential = true,
            "--json" => cli.json = true,
            other if other.starts_with("--") => bail!("opção desconhecida: {}", other),
            _ => cli.text.push(arg.clone()),
        }
    }

    Ok(cli)
}

fn read_input(cli: &CliArgs) -> anyhow::Result<String> {
    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path).with_context(|| format!("falha ao ler {:?}", path));
    }
    if !cli.text.is_empty() {
        return Ok(cli.text.join(" "));
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("falha ao ler a entrada padrão")?;
    Ok(buffer)
}

async fn run(cli: CliArgs, text: String) -> anyhow::Result<()> {
    // Granularidade validada antes de criar cliente ou disparar buscas
    let granularity: Granularity = cli.granularity.as_deref().unwrap_or("sentence").parse()?;

    let mut config = load_check_config();
    if let Some(max) = cli.concurrency {
        config.engine = config.engine.with_max_concurrency(max);
    }
    if cli.sequential {
        config.engine = config.engine.with_max_concurrency(1);
    }
    if let Some(secs) = cli.timeout_secs {
        config.engine = config.engine.with_timeout(Duration::from_secs(secs));
    }

    let provider = SerperClient::from_env(&config.search).context(
        "SERPER_API_KEY não encontrada. Defina no .env ou exporte: export SERPER_API_KEY=sua-chave",
    )?;
    let checker = PlagiarismChecker::from_config(Arc::new(provider), &config);

    let report = checker
        .check_with(&text, granularity, |index, entry| {
            log::info!("{}", format_unit_line(index, entry));
        })
        .await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        write_report(&mut std::io::stdout().lock(), &report)?;
    }

    Ok(())
}

/// Tenta carregar o arquivo .env do diretório atual
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => eprintln!("✓ Carregado .env de: {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("⚠ Erro ao carregar .env: {}", e),
    }
}

fn main() -> anyhow::Result<()> {
    // Carregar .env PRIMEIRO, antes de qualquer coisa
    load_dotenv();

    // Inicializar logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_hook();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("plagiarism-check");

    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_usage(program);
        return Ok(());
    }

    let cli = match parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!();
            print_usage(program);
            std::process::exit(2);
        }
    };

    let text = read_input(&cli)?;
    if text.trim().is_empty() {
        print_usage(program);
        std::process::exit(1);
    }

    let runtime = create_tokio_runtime(&load_runtime_config())?;
    runtime.block_on(run(cli, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_full() {
        let cli = parse_args(&args(&[
            "--by", "paragraph", "--concurrency", "4", "--timeout", "10", "--json", "some", "text",
        ]))
        .unwrap();

        assert_eq!(cli.granularity.as_deref(), Some("paragraph"));
        assert_eq!(cli.concurrency, Some(4));
        assert_eq!(cli.timeout_secs, Some(10));
        assert!(cli.json);
        assert!(!cli.sequential);
        assert_eq!(cli.text, vec!["some", "text"]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--concurrency", "many"])).is_err());
        assert!(parse_args(&args(&["--by"])).is_err());
        assert!(parse_args(&args(&["--unknown"])).is_err());
    }

    #[test]
    fn test_read_input_joins_text() {
        let cli = parse_args(&args(&["Hello", "world."])).unwrap();
        assert_eq!(read_input(&cli).unwrap(), "Hello world.");
    }
}
