//! # Parallel writes
//!
//! In a distributed run, every process owns a piece of the grid. Each process
//! writes its piece into a file of its own, and the process with rank 0 writes a
//! summary file (`.pvtu`, `.pvti`, ...) that references all pieces and that
//! visualization tools open as one dataset.
//!
//! The write is collective: all processes have to call
//! [`ParallelWriter::write_to_file`] with the same stem. The steps are
//!
//! 1. structured formats determine where each piece sits in the global index
//!    space (gathered on rank 0 and broadcast back)
//! 2. every process writes `<stem>-<rank>.<ext>`
//! 3. the processes exchange whether their piece was written, which doubles as
//!    the barrier before the summary is written
//! 4. rank 0 writes `<stem>.p<ext>` with the pieces in rank order
//! 5. a final exchange makes sure the summary exists before any process returns
//!
//! If any process fails to write its piece, that process returns its own error
//! and all others return [`Error::CollectiveFailure`]. Piece files that were
//! written are not removed.

mod communicator;
mod structured;

pub use communicator::{Communicator, LocalCommunicator, SerialCommunicator};

use crate::document::DocumentWriter;
use crate::error::{Error, StructuredLayout};
use crate::formats::sealed::PieceWriter;
use crate::formats::{PieceLayout, Summary, WritePiece};
use crate::grid::Grid;
use crate::writer::{with_suffix, Writer};

use std::path::{Path, PathBuf};

/// rank that assembles the global layout and writes the summary file
const ROOT: usize = 0;

/// Writes the local piece of a distributed grid, see the [module documentation](self)
pub struct ParallelWriter<'a, 'c, G, F, C> {
    writer: Writer<'a, G, F>,
    communicator: &'c C,
}

impl<'a, 'c, G, F, C> ParallelWriter<'a, 'c, G, F, C>
where
    G: Grid,
    F: WritePiece<G>,
    C: Communicator,
{
    pub fn new(writer: Writer<'a, G, F>, communicator: &'c C) -> Self {
        Self { writer, communicator }
    }

    /// the serial writer of the local piece, e.g. to register fields
    pub fn writer(&self) -> &Writer<'a, G, F> {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut Writer<'a, G, F> {
        &mut self.writer
    }

    /// path of the piece written by `rank`
    pub fn piece_path<P: AsRef<Path>>(stem: P, rank: usize) -> PathBuf {
        with_suffix(stem.as_ref(), &format!("-{}.{}", rank, F::EXTENSION))
    }

    /// path of the summary file
    pub fn summary_path<P: AsRef<Path>>(stem: P) -> PathBuf {
        with_suffix(stem.as_ref(), &format!(".p{}", F::EXTENSION))
    }

    /// Write the local piece and, on rank 0, the summary file. Returns the path
    /// of the summary file on every rank.
    pub fn write_to_file<P: AsRef<Path>>(&self, stem: P) -> Result<PathBuf, Error> {
        let comm = self.communicator;
        let rank = comm.rank();
        let stem = stem.as_ref();

        let layouts = self.exchange_layouts()?;
        let layout = layouts.get(rank).copied().flatten();

        let piece = Self::piece_path(stem, rank);
        let written = self.writer.write_piece_to_file(&piece, layout);
        if let Err(e) = &written {
            tracing::warn!(rank, path = %piece.display(), "failed to write piece: {}", e);
        }

        let failed_ranks = self.failed_ranks(written.is_ok())?;
        written?;
        if !failed_ranks.is_empty() {
            return Err(Error::CollectiveFailure { failed_ranks });
        }

        let summary_path = Self::summary_path(stem);
        let summary = if rank == ROOT {
            let summary = Summary {
                sources: (0..comm.size()).map(|r| file_name(&Self::piece_path(stem, r))).collect(),
                layouts,
                rank,
            };
            self.write_summary(&summary_path, &summary)
        } else {
            Ok(())
        };

        // broadcasting the outcome keeps everyone waiting until the summary exists
        let summary_written = comm.broadcast((rank == ROOT).then(|| summary.is_ok()), ROOT)?;
        summary?;
        if !summary_written {
            return Err(Error::CollectiveFailure {
                failed_ranks: vec![ROOT],
            });
        }

        Ok(summary_path)
    }

    /// Gather the placement of every structured piece on the root, compute the
    /// global layout there and hand it back to everyone
    fn exchange_layouts(&self) -> Result<Vec<Option<PieceLayout>>, Error> {
        let comm = self.communicator;
        let placement = self
            .writer
            .format()
            .placement(self.writer.grid())
            .map_err(|e| e.to_string());
        let placements = comm.gather(placement, ROOT)?;

        let layouts = placements.map(|placements| -> Result<Vec<Option<PieceLayout>>, String> {
            let placements = placements
                .into_iter()
                .enumerate()
                .map(|(rank, placement)| placement.map_err(|reason| format!("rank {}: {}", rank, reason)))
                .collect::<Result<Vec<_>, _>>()?;

            match placements.iter().copied().collect::<Option<Vec<_>>>() {
                Some(placements) => structured::reconstruct(&placements)
                    .map(|layouts| layouts.into_iter().map(Some).collect())
                    .map_err(|e| e.reason),
                None => Ok(vec![None; placements.len()]),
            }
        });

        let layouts = comm.broadcast(layouts, ROOT)?;
        layouts.map_err(|reason| StructuredLayout::new(reason).into())
    }

    /// Ranks that failed to write their piece, known to all ranks
    fn failed_ranks(&self, written: bool) -> Result<Vec<usize>, Error> {
        let comm = self.communicator;
        let statuses = comm.gather(written, ROOT)?;
        let failed = statuses.map(|statuses| {
            statuses
                .iter()
                .enumerate()
                .filter(|(_, ok)| !**ok)
                .map(|(rank, _)| rank)
                .collect::<Vec<_>>()
        });
        comm.broadcast(failed, ROOT)
    }

    fn write_summary(&self, path: &Path, summary: &Summary) -> Result<(), Error> {
        let mut doc = DocumentWriter::new(self.writer.resolved_options());
        doc.start_document(&format!("P{}", F::GRID_TYPE), F::VERSION)?;
        self.writer
            .format()
            .write_summary(&mut doc, self.writer.grid(), self.writer.fields(), summary)?;

        let mut buffer = Vec::new();
        doc.finish(&mut buffer)?;
        std::fs::write(path, &buffer)?;

        tracing::debug!(path = %path.display(), pieces = summary.sources.len(), "wrote summary");
        Ok(())
    }
}

/// file name of a piece as referenced from the summary, which lives in the same
/// directory
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
