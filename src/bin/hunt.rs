use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mnemonic_hunt::{
    config::ClientConfig,
    constants::MNEMONIC_WORD_COUNT,
    db::Database,
    integrations::{GameApiClient, ImageFetch},
    models::{PaymentRequired, StoredImage},
    services::{pricing::format_usd, Bip39Validator, Selection},
    storage::{GameStore, RedisKeyValueStore},
    utils::decode_image_base64,
};

type Vault = GameStore<Database, RedisKeyValueStore>;

const USAGE: &str = "usage: hunt <command> [args]

commands:
  price <idx>                 fee for revealing the given positions (e.g. 1,2,3)
  generate <idx>              request an image and save it to the vault
  gallery                     list saved images, newest first
  show <id> [out.jpg]         print an image record, optionally exporting the JPEG
  delete <id>                 remove a saved image
  clear                       remove every saved image
  guess                       print the saved guess grid
  guess-save <w0> .. <w23>    save a guess grid (`-` for a blank position)
  validate <word> ..          check words against the BIP39 English list";

async fn open_vault(config: &ClientConfig) -> anyhow::Result<Vault> {
    let db = Database::new(config).await?;
    db.run_migrations().await?;
    let items = RedisKeyValueStore::connect(&config.redis_url).await?;
    Ok(GameStore::new(db, items))
}

fn load_config() -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::from_env()?;
    config.validate()?;
    Ok(config)
}

fn arg<'a>(args: &'a [String], position: usize, name: &str) -> anyhow::Result<&'a str> {
    args.get(position)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing <{}>\n\n{}", name, USAGE))
}

fn run_price(args: &[String]) -> anyhow::Result<()> {
    let selection = Selection::parse(arg(args, 2, "idx")?)?;
    println!(
        "{} positions [{}]: {}",
        selection.len(),
        selection,
        format_usd(selection.price())
    );
    Ok(())
}

fn print_challenge(challenge: &PaymentRequired) {
    println!("Payment required for {}", challenge.resource.url);
    for option in &challenge.accepts {
        println!(
            "  {} {} units of {} on {} to {} (valid {}s)",
            option.scheme,
            option.amount,
            option.asset,
            option.network,
            option.pay_to,
            option.max_timeout_seconds
        );
    }
}

async fn run_generate(args: &[String]) -> anyhow::Result<()> {
    let selection = Selection::parse(arg(args, 2, "idx")?)?;
    let config = load_config()?;
    let api = GameApiClient::new(config.api_url.clone());

    println!(
        "Requesting image for [{}] ({})",
        selection,
        format_usd(selection.price())
    );

    let mut fetched = api.request_image(&selection, None).await?;
    if let ImageFetch::PaymentRequired(challenge) = &fetched {
        print_challenge(challenge);
        let Some(payment) = config.payment_signature.as_deref() else {
            anyhow::bail!("no signed payment configured (set HUNT_PAYMENT_SIGNATURE)");
        };
        tracing::debug!("Retrying with configured payment payload");
        fetched = api.request_image(&selection, Some(payment)).await?;
    }

    let image = match fetched {
        ImageFetch::Image(image) => image,
        ImageFetch::PaymentRequired(challenge) => {
            anyhow::bail!(
                "payment was not accepted: {}",
                challenge.error.as_deref().unwrap_or("unknown reason")
            );
        }
    };

    let vault = open_vault(&config).await?;
    let record = StoredImage::new(image.base64, &selection, Utc::now());
    let id = vault.save_image(&record).await?;
    println!("Saved {}", id);
    Ok(())
}

async fn run_gallery() -> anyhow::Result<()> {
    let vault = open_vault(&load_config()?).await?;
    let images = vault.list_images().await;
    if images.is_empty() {
        println!("No images yet");
        return Ok(());
    }
    for meta in images {
        let indices: Vec<String> = meta.indices.iter().map(|i| i.to_string()).collect();
        println!(
            "{}  [{}]  {}  {}",
            meta.id,
            indices.join(", "),
            format_usd(meta.price),
            meta.created_at.to_rfc3339()
        );
    }
    Ok(())
}

async fn run_show(args: &[String]) -> anyhow::Result<()> {
    let id = arg(args, 2, "id")?;
    let vault = open_vault(&load_config()?).await?;
    let Some(image) = vault.get_image(id).await else {
        anyhow::bail!("image {} not found", id);
    };

    println!("id:       {}", image.id);
    println!("indices:  {:?}", image.indices);
    println!("price:    {}", format_usd(image.price));
    println!("created:  {}", image.created_at.to_rfc3339());

    if let Some(out) = args.get(3) {
        let bytes = decode_image_base64(&image.base64)?;
        tokio::fs::write(out, &bytes).await?;
        println!("Wrote {} bytes to {}", bytes.len(), out);
    }
    Ok(())
}

async fn run_delete(args: &[String]) -> anyhow::Result<()> {
    let id = arg(args, 2, "id")?;
    let vault = open_vault(&load_config()?).await?;
    vault.delete_image(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

async fn run_clear() -> anyhow::Result<()> {
    let vault = open_vault(&load_config()?).await?;
    vault.clear_all().await?;
    println!("Vault cleared");
    Ok(())
}

async fn run_guess() -> anyhow::Result<()> {
    let vault = open_vault(&load_config()?).await?;
    let Some(grid) = vault.get_guess().await else {
        println!("No guess saved");
        return Ok(());
    };
    for (position, word) in grid.guesses.iter().enumerate() {
        println!("{:>2}  {}", position, word.as_deref().unwrap_or("-"));
    }
    println!("phrase: {}", grid.phrase());
    println!(
        "{}/{} filled, saved {}",
        grid.filled(),
        MNEMONIC_WORD_COUNT,
        grid.timestamp.to_rfc3339()
    );
    Ok(())
}

fn parse_guess_words(raw: &[String]) -> Vec<Option<String>> {
    raw.iter()
        .map(|w| match w.trim() {
            "" | "-" => None,
            word => Some(word.to_string()),
        })
        .collect()
}

async fn run_guess_save(args: &[String]) -> anyhow::Result<()> {
    let words = parse_guess_words(args.get(2..).unwrap_or_default());
    if words.len() > MNEMONIC_WORD_COUNT {
        anyhow::bail!("at most {} words can be saved", MNEMONIC_WORD_COUNT);
    }

    let config = load_config()?;
    let validator = Bip39Validator::new(config.bip39_wordlist_url.clone());
    let result = validator.validate_words(&words).await;
    if !result.is_valid {
        for invalid in &result.invalid_words {
            eprintln!("position {}: '{}' is not a BIP39 word", invalid.position, invalid.word);
        }
        anyhow::bail!("guess not saved");
    }

    let vault = open_vault(&config).await?;
    let grid = vault.save_guess(&words).await?;
    println!("Saved guess ({}/{} filled)", grid.filled(), MNEMONIC_WORD_COUNT);
    Ok(())
}

async fn run_validate(args: &[String]) -> anyhow::Result<()> {
    let words = parse_guess_words(args.get(2..).unwrap_or_default());
    let source = ClientConfig::from_env()
        .ok()
        .and_then(|c| c.bip39_wordlist_url);
    let result = Bip39Validator::new(source).validate_words(&words).await;

    if result.is_valid {
        println!("All words are valid BIP39 words");
        return Ok(());
    }
    for invalid in &result.invalid_words {
        println!("position {}: '{}' is not a BIP39 word", invalid.position, invalid.word);
    }
    anyhow::bail!("{} invalid word(s)", result.invalid_words.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mnemonic_hunt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    match command.as_str() {
        "price" => run_price(&args),
        "generate" => run_generate(&args).await,
        "gallery" => run_gallery().await,
        "show" => run_show(&args).await,
        "delete" => run_delete(&args).await,
        "clear" => run_clear().await,
        "guess" => run_guess().await,
        "guess-save" => run_guess_save(&args).await,
        "validate" => run_validate(&args).await,
        other => {
            eprintln!("unknown command '{}'\n\n{}", other, USAGE);
            std::process::exit(1);
        }
    }
}
