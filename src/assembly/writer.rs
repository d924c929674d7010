//src/assembly/writer.rs

use std::io::Write;

use petgraph::visit::EdgeRef;

use crate::error::Result;
use crate::progress::ProgressListener;
use crate::types::Contig;

use super::overlap_graph::OverlapGraphBuild;

/// Writes contigs as FASTA, one sequence line per record.
pub fn write_contigs<W: Write>(writer: &mut W, contigs: &[Contig], progress: &ProgressListener) -> Result<()> {
    progress.set_subtask("Writing contigs");
    progress.set_maximum(contigs.len() as u64);
    for contig in contigs {
        writeln!(writer, ">{}", contig.header.trim_start_matches('>'))?;
        writeln!(writer, "{}", contig.sequence)?;
        progress.increment()?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the overlap graph in GML. Nodes carry the read name and sequence,
/// edges the overlap length. Returns the number of nodes and edges written.
pub fn write_overlap_graph<W: Write>(writer: &mut W, build: &OverlapGraphBuild, label: &str) -> Result<(usize, usize)> {
    let graph = &build.graph;
    writeln!(writer, "graph [")?;
    writeln!(writer, "\tcomment \"Overlap graph\"")?;
    writeln!(writer, "\tdirected 1")?;
    writeln!(writer, "\tid 1")?;
    writeln!(writer, "\tlabel \"{}\"", gml_string(label))?;

    for node in graph.node_indices() {
        let read = &build.reads[graph[node]];
        writeln!(writer, "\tnode [")?;
        writeln!(writer, "\t\tid {}", node.index())?;
        writeln!(writer, "\t\tlabel \"{}\"", gml_string(&read.name))?;
        writeln!(writer, "\t\tsequence \"{}\"", read.segment)?;
        writeln!(writer, "\t]")?;
    }
    for edge in graph.edge_references() {
        writeln!(writer, "\tedge [")?;
        writeln!(writer, "\t\tsource {}", edge.source().index())?;
        writeln!(writer, "\t\ttarget {}", edge.target().index())?;
        writeln!(writer, "\t\toverlap {}", edge.weight())?;
        writeln!(writer, "\t]")?;
    }
    writeln!(writer, "]")?;
    writer.flush()?;
    Ok((graph.node_count(), graph.edge_count()))
}

fn gml_string(s: &str) -> String {
    s.replace('"', "'")
}
