//! 命令行参数定义

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// 📖 Lectio - 终端里的逐词速读工具
#[derive(Debug, Parser)]
#[command(name = "lectio")]
#[command(about = "逐词快速阅读（RSVP），支持EPUB与纯文本")]
#[command(version)]
pub struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// 数据目录，覆盖配置文件中的设置
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 导入EPUB或纯文本文件
    Import {
        /// 文件路径；扩展名为 .epub 时按EPUB解析
        file: PathBuf,
    },
    /// 从标准输入读取文本并保存
    Add,
    /// 列出已保存的文本
    List,
    /// 删除已保存的文本
    Delete {
        /// 文本标识
        id: String,
    },
    /// 显示EPUB的书名、作者与章节
    Info {
        /// EPUB文件路径
        epub: PathBuf,
    },
    /// 在终端中阅读
    Read(ReadArgs),
    /// 生成默认配置文件
    InitConfig,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// 文本标识
    pub id: String,

    /// 初始速度（每分钟词数）
    #[arg(long)]
    pub wpm: Option<u32>,

    /// 关闭可变时长，每个词显示相同时间
    #[arg(long)]
    pub fixed_timing: bool,
}
