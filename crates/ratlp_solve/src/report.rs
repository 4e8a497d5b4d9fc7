use std::io::{self, Write};

use num_traits::Zero;
use ratlp_num::BigRational;

use crate::lp::Lp;
use crate::status::LpStatus;

/// Write the solution report.
///
/// A proven optimum prints the status, the objective value, and the
/// nonzero entries of the primal values, reduced costs, row duals, and
/// slacks. Proven infeasibility and unboundedness print only their status
/// line; everything else prints `status NOT_SOLVED`.
pub fn print_sol<W: Write>(lp: &Lp<BigRational>, out: &mut W) -> io::Result<()> {
    let status = lp.status();
    let cache = match (status, lp.solution()) {
        (LpStatus::Optimal, Some(cache)) => cache,
        _ => {
            writeln!(out, "status {}", status.print_name())?;
            return Ok(());
        }
    };

    writeln!(out, "status OPTIMAL")?;
    writeln!(out, "\tValue = {}", cache.val)?;
    writeln!(out, "VARS:")?;
    for (i, v) in cache.x.iter().enumerate() {
        if !v.is_zero() {
            writeln!(out, "{} = {}", lp.colnames[i], v)?;
        }
    }
    writeln!(out, "REDUCED COST:")?;
    for (i, v) in cache.rc.iter().enumerate() {
        if !v.is_zero() {
            writeln!(out, "{} = {}", lp.colnames[i], v)?;
        }
    }
    writeln!(out, "PI:")?;
    for (r, v) in cache.pi.iter().enumerate() {
        if !v.is_zero() {
            writeln!(out, "{} = {}", lp.rownames[r], v)?;
        }
    }
    writeln!(out, "SLACK:")?;
    for (r, v) in cache.slack.iter().enumerate() {
        if !v.is_zero() {
            writeln!(out, "{} = {}", lp.rownames[r], v)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{Basis, ColStatus, RowStatus};
    use crate::certify::optimal_test;
    use crate::lp::{RowSense, Sense};
    use ratlp_num::LpScalar;

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::from_int_ratio(p, q as u64)
    }

    fn render(lp: &Lp<BigRational>) -> String {
        let mut buf = Vec::new();
        print_sol(lp, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn optimal_report_lists_nonzero_entries_only() {
        // min x,  x >= 1 (row),  0 <= x <= 2
        let mut lp = Lp::new("report", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), rat(2, 1), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(1, 1)],
            &[RowSense::Gte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        let basis = Basis {
            cstat: vec![ColStatus::Basic],
            rstat: vec![RowStatus::Upper],
        };
        let mut x = vec![rat(1, 1), rat(0, 1)];
        let y = vec![rat(1, 1)];
        optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap();

        insta::assert_snapshot!(render(&lp), @r"
        status OPTIMAL
        	Value = 1
        VARS:
        x = 1
        REDUCED COST:
        PI:
        c0 = 1
        SLACK:
        ");
    }

    #[test]
    fn rational_values_print_as_fractions() {
        let mut lp = Lp::new("fracs", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(1, 3), rat(1, 3), Some("x"));
        let basis = Basis {
            cstat: vec![ColStatus::Lower],
            rstat: vec![],
        };
        let mut x = vec![rat(1, 3)];
        optimal_test(&mut lp, &mut x, &[], &basis).unwrap().unwrap();
        let report = render(&lp);
        assert!(report.contains("Value = 1/3"));
        assert!(report.contains("x = 1/3"));
    }

    #[test]
    fn non_terminal_statuses_print_a_single_line() {
        let lp = Lp::<BigRational>::new("plain", Sense::Minimize);
        assert_eq!(render(&lp), "status NOT_SOLVED\n");
    }
}
