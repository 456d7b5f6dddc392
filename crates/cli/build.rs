use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("eitaa-relay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Relay new Eitaa channel posts to Telegram")
        .arg(clap::arg!(-u --username <NAME> "Eitaa channel username (e.g. m_ahlebeit)").env("USERNAME"))
        .arg(
            clap::arg!(-o --output <FILE> "JSON file receiving the extracted posts")
                .env("OUTPUT")
                .default_value("posts.json")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"telegram-token" <TOKEN> "Telegram bot token").env("TELEGRAM_TOKEN"))
        .arg(clap::arg!(--"telegram-chat-id" <CHAT> "Telegram chat id, or @channel username").env("TELEGRAM_CHAT_ID"))
        .arg(
            clap::arg!(--"sent-ids-file" <FILE> "File storing the ids of posts already sent")
                .env("SENT_IDS_FILE")
                .default_value("sent_ids.json")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--"raw-html-file" <FILE> "File receiving the raw channel page")
                .env("RAW_HTML_FILE")
                .default_value("channel_page.html")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-i --input <FILE> "Read the channel page from a saved HTML file instead of fetching it")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"base-url" <URL> "Origin of the channel site").default_value("https://eitaa.com"))
        .arg(
            clap::arg!(--"media-dir" <DIR> "Download images into this directory and upload them")
                .env("MEDIA_DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-footer" "Send only the post text, without forwarded/reply/date lines"))
        .arg(clap::arg!(--"escape-markdown" "Escape messages for Telegram MarkdownV2"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--"dry-run" "Extract and report what would be sent without sending anything"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "eitaa-relay", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "eitaa-relay", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "eitaa-relay", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "eitaa-relay", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
