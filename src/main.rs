use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::process;

use clap::Parser;
use lectio::cli::{Cli, Command, ReadArgs};
use lectio::terminal::{self, CrosstermInput, TerminalReader};
use lectio::{Book, FileStore, LectioError, Library, ReaderConfig, Result, SavedText};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = lectio::logging::init() {
        eprintln!("⚠️  {}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("❌ 错误: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // 生成配置文件时不需要读取现有配置
    let command = match cli.command {
        Command::InitConfig => return init_config(&cli.config),
        command => command,
    };

    let mut config = ReaderConfig::load_or_default(&cli.config)?;
    if let Some(data_dir) = &cli.data_dir {
        config.library.data_dir = data_dir.clone();
    }

    match command {
        Command::Import { file } => {
            let mut library = open_library(config);
            let saved = library.import_file(&file)?;
            print_saved(&saved);
        }
        Command::Add => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body)?;
            let mut library = open_library(config);
            let saved = library.add_text(&body)?;
            print_saved(&saved);
        }
        Command::List => list_texts(&open_library(config)),
        Command::Delete { id } => {
            let mut library = open_library(config);
            if !library.delete(&id)? {
                return Err(LectioError::TextNotFound(id));
            }
            println!("🗑️  已删除: {}", id);
        }
        Command::Info { epub } => display_book_info(&Book::open(&epub)?),
        Command::Read(args) => read_text(config, args)?,
        Command::InitConfig => {}
    }

    Ok(())
}

fn open_library(config: ReaderConfig) -> Library<FileStore> {
    let store = FileStore::new(config.library.data_dir.clone());
    Library::new(store, config)
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(LectioError::ConfigError(format!(
            "配置文件已存在: {}",
            path.display()
        )));
    }
    ReaderConfig::generate_default_config(path)?;
    println!("✅ 已生成配置文件: {}", path.display());
    Ok(())
}

/// 显示新保存的文本
fn print_saved(saved: &SavedText) {
    println!("✅ 已保存: {}", saved.display_name());
    println!("   词数: {}", saved.total_words);
    if let Some(chapters) = &saved.chapters {
        println!("   章节: {} 个", chapters.len());
    }
    println!("🆔 {}", saved.id);
}

/// 列出书库
fn list_texts(library: &Library<FileStore>) {
    let texts = library.list();
    if texts.is_empty() {
        println!("📚 书库为空");
        return;
    }

    println!("📚 已保存 {} 篇文本:", texts.len());
    for text in &texts {
        let status = if text.is_complete() {
            "Complete".to_string()
        } else {
            format!("{}%", text.progress_percent())
        };
        println!(
            "  {}  {:>8}  {:>7} 词  {}",
            text.id,
            status,
            text.total_words,
            text.display_name()
        );
    }
}

/// 显示EPUB信息
fn display_book_info(book: &Book) {
    println!("📖 书名: {}", book.title);
    if !book.creators.is_empty() {
        println!("✍️  作者: {}", book.creators.join(", "));
    }
    if let Some(language) = &book.language {
        println!("🌐 语言: {}", language);
    }
    println!("📏 词数: {}", book.word_count);

    match &book.chapters {
        Some(chapters) => {
            println!("\n📚 章节 ({} 个):", chapters.len());
            for (i, chapter) in chapters.iter().enumerate() {
                println!(
                    "  {}. {} [第 {} 个词]",
                    i + 1,
                    chapter.title,
                    chapter.start_word_index + 1
                );
            }
        }
        None => println!("\n📚 没有章节信息"),
    }
}

/// 进入终端阅读
fn read_text(mut config: ReaderConfig, args: ReadArgs) -> Result<()> {
    if args.fixed_timing {
        config.playback.variable_timing = false;
    }
    let wpm_step = config.playback.wpm_step;

    let library = open_library(config);
    let mut session = library.open_session(&args.id, args.wpm)?;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(LectioError::NotATerminal);
    }

    let title = session.saved.display_name().to_string();
    let chapters = session.saved.chapters.clone().unwrap_or_default();
    let mut reader = TerminalReader::new(terminal::setup_terminal()?, title, chapters, wpm_step);

    // 无论阅读循环是否出错都先恢复终端
    let result = reader.run(&mut session.engine, &mut CrosstermInput);
    terminal::restore_terminal(reader.terminal_mut())?;
    result?;

    println!("📖 {}", session.saved.display_name());
    let engine = &session.engine;
    println!(
        "📍 阅读位置: {}/{}",
        engine.current_index() + 1,
        engine.len()
    );
    Ok(())
}
