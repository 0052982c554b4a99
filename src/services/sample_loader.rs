//! 样本准备服务 - 业务能力层
//!
//! 读取人工评分 CSV，按 participant_id 找到对应的提交目录，
//! 拼接其中所有 Java 源文件，生成样本列表。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{AppError, AppResult, DataError, FileError};
use crate::models::{HumanRow, Sample};
use crate::services::artifact_writer;

const PARTICIPANT_COLUMN: &str = "participant_id";
const SOURCE_EXTENSION: &str = "java";

/// 准备样本并写入 `output_path`
pub fn prepare_samples(
    samples_csv: &Path,
    submissions_dir: &Path,
    output_path: &Path,
) -> AppResult<Vec<Sample>> {
    let rows = read_human_rows(samples_csv)?;
    let participant_ids = collect_participant_ids(&rows);
    info!("找到 {} 个参与者", participant_ids.len());

    let folders = list_submission_folders(submissions_dir)?;

    let mut samples = Vec::with_capacity(participant_ids.len());
    for pid in participant_ids {
        let Some(folder) = find_submission_folder(&folders, &pid) else {
            warn!("参与者 {} 没有对应的提交目录", pid);
            continue;
        };

        let code = concat_sources(folder)?;
        let human_rows = rows
            .iter()
            .filter(|row| participant_of(row) == Some(pid.as_str()))
            .cloned()
            .collect();

        samples.push(Sample {
            submission_id: pid,
            code,
            human_rows,
        });
    }

    artifact_writer::write_json(output_path, &samples)?;
    info!("已准备 {} 个样本 -> {}", samples.len(), output_path.display());
    Ok(samples)
}

/// 读取 CSV 的全部行
pub fn read_human_rows(samples_csv: &Path) -> AppResult<Vec<HumanRow>> {
    let csv_path = samples_csv.display().to_string();
    if !samples_csv.exists() {
        return Err(FileError::NotFound { path: csv_path }.into());
    }

    let csv_error = |source| {
        AppError::Data(DataError::CsvFailed {
            path: csv_path.clone(),
            source,
        })
    };

    let mut reader = csv::Reader::from_path(samples_csv).map_err(csv_error)?;
    reader
        .deserialize::<HumanRow>()
        .map(|row| row.map_err(csv_error))
        .collect()
}

fn participant_of(row: &HumanRow) -> Option<&str> {
    row.get(PARTICIPANT_COLUMN)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// 去重后按数字排序（非数字编号视为 0）
fn collect_participant_ids(rows: &[HumanRow]) -> Vec<String> {
    let unique: BTreeSet<&str> = rows.iter().filter_map(participant_of).collect();
    let mut ids: Vec<String> = unique.into_iter().map(str::to_string).collect();
    ids.sort_by_key(|id| (id.parse::<u64>().unwrap_or(0), id.clone()));
    ids
}

fn list_submission_folders(submissions_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !submissions_dir.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: submissions_dir.display().to_string(),
        }
        .into());
    }

    let entries = fs::read_dir(submissions_dir)
        .map_err(|e| AppError::file_read_failed(submissions_dir.display().to_string(), e))?;

    let mut folders = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| AppError::file_read_failed(submissions_dir.display().to_string(), e))?;
        folders.push(entry.path());
    }
    folders.sort();
    Ok(folders)
}

/// 目录名中包含 `Submission_<pid>`，且其后不再紧跟数字
fn find_submission_folder<'a>(folders: &'a [PathBuf], pid: &str) -> Option<&'a Path> {
    let marker = format!("Submission_{}", pid);
    folders
        .iter()
        .find(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            name.match_indices(&marker).any(|(pos, _)| {
                !name[pos + marker.len()..]
                    .starts_with(|c: char| c.is_ascii_digit())
            })
        })
        .map(PathBuf::as_path)
}

/// 递归拼接目录下所有源文件
///
/// 每一层先处理本目录的文件，再进入子目录，同类按文件名排序。
fn concat_sources(folder: &Path) -> AppResult<String> {
    let mut parts = Vec::new();

    let walker = WalkDir::new(folder).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            AppError::file_read_failed(folder.display().to_string(), e.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION)
        {
            continue;
        }

        let bytes =
            fs::read(path).map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let text = String::from_utf8_lossy(&bytes);
        parts.push(format!(
            "// --- {} ---\n{}\n",
            entry.file_name().to_string_lossy(),
            text
        ));
    }

    Ok(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_participant_ids_sorted_numerically() {
        let rows: Vec<HumanRow> = ["10", "2", " 2 ", "", "abc", "1"]
            .iter()
            .map(|pid| HumanRow::from([(PARTICIPANT_COLUMN.to_string(), pid.to_string())]))
            .collect();
        assert_eq!(collect_participant_ids(&rows), vec!["abc", "1", "2", "10"]);
    }

    #[test]
    fn test_folder_match_does_not_take_longer_id() {
        let folders = vec![
            PathBuf::from("subs/18~19_Submission_15"),
            PathBuf::from("subs/18~19_Submission_1"),
        ];
        assert_eq!(
            find_submission_folder(&folders, "1"),
            Some(Path::new("subs/18~19_Submission_1"))
        );
        assert_eq!(
            find_submission_folder(&folders, "15"),
            Some(Path::new("subs/18~19_Submission_15"))
        );
        assert_eq!(find_submission_folder(&folders, "5"), None);
    }

    #[test]
    fn test_prepare_samples_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("samples.csv");
        write(
            &csv_path,
            "participant_id,skill,grade\n15,Correctness,A\n15,Readability,B\n3,Correctness,C\n",
        );

        let subs = dir.path().join("submissions");
        write(&subs.join("18~19_Submission_15/src/Rabbit.java"), "class Rabbit {}");
        write(&subs.join("18~19_Submission_15/Animal.java"), "class Animal {}");
        write(&subs.join("18~19_Submission_15/notes.txt"), "ignored");

        let output = dir.path().join("out/samples.json");
        let samples = prepare_samples(&csv_path, &subs, &output).unwrap();

        // 参与者 3 没有提交目录，被跳过
        assert_eq!(samples.len(), 1);
        let sample = &samples[0];
        assert_eq!(sample.submission_id, "15");
        assert_eq!(sample.human_rows.len(), 2);
        assert_eq!(sample.human_rows[0]["skill"], "Correctness");
        assert_eq!(
            sample.code,
            "// --- Animal.java ---\nclass Animal {}\n\n// --- Rabbit.java ---\nclass Rabbit {}\n"
        );
        assert!(!sample.code.contains("ignored"));

        let written: Vec<Sample> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, samples);
    }

    #[test]
    fn test_files_come_before_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("18~19_Submission_4");
        write(&folder.join("a/X.java"), "class X {}");
        write(&folder.join("Zoo.java"), "class Zoo {}");
        write(&folder.join("a/b/Y.java"), "class Y {}");
        write(&folder.join("a/W.java"), "class W {}");

        let code = concat_sources(&folder).unwrap();
        let order: Vec<&str> = code
            .lines()
            .filter(|line| line.starts_with("// --- "))
            .collect();
        assert_eq!(
            order,
            vec![
                "// --- Zoo.java ---",
                "// --- W.java ---",
                "// --- X.java ---",
                "// --- Y.java ---",
            ]
        );
    }

    #[test]
    fn test_missing_csv() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_samples(
            &dir.path().join("none.csv"),
            dir.path(),
            &dir.path().join("out.json"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
