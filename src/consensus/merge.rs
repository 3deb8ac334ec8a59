use crate::graph::{Assembly, ContigNode, Sequence};
use crate::utils::Result;

/// Base inserted between two contigs whose overlap could not be reconciled.
const FILLER: u8 = b'n';

/// Consensus of two overlapping bases. Bases agree if they are equal
/// ignoring case, and `N` defers to the other base. The result is
/// lowercase if either input is lowercase.
pub fn consensus_base(a: u8, b: u8) -> Option<u8> {
    let masked = a.is_ascii_lowercase() || b.is_ascii_lowercase();
    let (ua, ub) = (a.to_ascii_uppercase(), b.to_ascii_uppercase());
    let base = if ua == ub {
        ua
    } else if ua == b'N' {
        ub
    } else if ub == b'N' {
        ua
    } else {
        return None;
    };
    Some(if masked {
        base.to_ascii_lowercase()
    } else {
        base
    })
}

fn overlap_consensus(a: &[u8], b: &[u8]) -> Option<Sequence> {
    if a == b {
        return Some(a.to_vec());
    }
    a.iter()
        .zip(b)
        .map(|(&x, &y)| consensus_base(x, y))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub enum OverlapMerge {
    Consensus,
    /// The overlap could not be reconciled; a filler base now separates
    /// the two sequences. Holds the last tail that was compared.
    Mismatch { tail: Sequence },
}

/// Appends `next` to `seq`, replacing the `overlap` bases they share by
/// their consensus. While the consensus fails and `seq` ends with a
/// filler base, that base is trimmed and the comparison retried.
pub fn merge_overlap(overlap: usize, seq: &mut Sequence, next: &[u8]) -> Result<OverlapMerge> {
    if next.len() <= overlap {
        return Err(format!(
            "Sequence of {} bases cannot overlap its predecessor by {} bases",
            next.len(),
            overlap
        ));
    }
    let head = &next[..overlap];
    loop {
        if seq.len() <= overlap {
            return Err(format!(
                "Sequence of {} bases is too short for an overlap of {} bases",
                seq.len(),
                overlap
            ));
        }
        let tail_start = seq.len() - overlap;
        if let Some(consensus) = overlap_consensus(&seq[tail_start..], head) {
            seq.truncate(tail_start);
            seq.extend_from_slice(&consensus);
            seq.extend_from_slice(&next[overlap..]);
            return Ok(OverlapMerge::Consensus);
        }
        if seq.last() == Some(&FILLER) {
            seq.pop();
            continue;
        }
        let tail = seq[tail_start..].to_vec();
        seq.push(FILLER);
        seq.extend_from_slice(next);
        return Ok(OverlapMerge::Mismatch { tail });
    }
}

/// Concatenates the sequences of `path`, merging each pair of adjacent
/// contigs over the overlap given by their graph edge.
pub fn merge_path(asm: &Assembly, path: &[ContigNode]) -> Result<Sequence> {
    let Some((&first, rest)) = path.split_first() else {
        return Ok(Sequence::new());
    };
    let mut seq = asm.sequence(first);
    let mut prev = first;
    for &node in rest {
        let distance = asm.graph.edge_distance(prev, node).ok_or_else(|| {
            format!(
                "No edge between {} and {} in path {}",
                asm.dict.node(prev),
                asm.dict.node(node),
                asm.format_path(path)
            )
        })?;
        if distance >= 0 {
            return Err(format!(
                "Expected an overlap between {} and {} but the distance is {}",
                asm.dict.node(prev),
                asm.dict.node(node),
                distance
            ));
        }
        let overlap = distance.unsigned_abs() as usize;
        let next = asm.sequence(node);
        if let OverlapMerge::Mismatch { tail } = merge_overlap(overlap, &mut seq, &next)? {
            log::warn!(
                "The head of `{}` does not match the tail of the previous contig\n{}\n{}\n{}",
                asm.dict.node(node),
                String::from_utf8_lossy(&tail),
                String::from_utf8_lossy(&next[..overlap]),
                asm.format_path(path)
            );
        }
        prev = node;
    }
    Ok(seq)
}
